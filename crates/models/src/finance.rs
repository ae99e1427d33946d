//! Income/expense aggregation used by the finance listing and dashboard.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use crate::{expense::Expense, income::Income, resource::DocumentId};

/// Which side of the ledger a record sits on.
///
/// Anything not explicitly tagged as income counts as an expense.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FinanceKind {
    Income,
    #[default]
    Expense,
}

/// Attributes for creating or updating an income or expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct FinanceDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// Owning project, addressed by its document id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<DocumentId>,
}

/// A single row of the merged finance listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FinanceEntry {
    #[serde(default, rename = "type")]
    pub kind: FinanceKind,
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub payment_method: Option<String>,
}

impl FinanceEntry {
    /// Amount with its ledger sign applied.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            FinanceKind::Income => self.amount,
            FinanceKind::Expense => self.amount.saturating_neg(),
        }
    }
}

impl From<&Income> for FinanceEntry {
    fn from(income: &Income) -> Self {
        Self {
            kind: FinanceKind::Income,
            document_id: income.document_id.clone(),
            amount: income.amount,
            description: income.description.clone().unwrap_or_default(),
            date: income.date,
            payment_method: income.payment_method.clone(),
        }
    }
}

impl From<&Expense> for FinanceEntry {
    fn from(expense: &Expense) -> Self {
        Self {
            kind: FinanceKind::Expense,
            document_id: expense.document_id.clone(),
            amount: expense.amount,
            description: expense.description.clone().unwrap_or_default(),
            date: expense.date,
            payment_method: expense.payment_method.clone(),
        }
    }
}

/// Σ income − Σ expense
pub fn calculate_total<'a>(entries: impl IntoIterator<Item = &'a FinanceEntry>) -> i64 {
    entries.into_iter().map(FinanceEntry::signed_amount).sum()
}

/// Newest first. Stable, so entries sharing a date keep their relative order.
pub fn sort_newest_first(entries: &mut [FinanceEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Merge incomes and expenses into one listing sorted newest first.
/// Ties keep incomes ahead of expenses, each in server order.
pub fn finance_entries(incomes: &[Income], expenses: &[Expense]) -> Vec<FinanceEntry> {
    let mut entries: Vec<FinanceEntry> = incomes
        .iter()
        .map(FinanceEntry::from)
        .chain(expenses.iter().map(FinanceEntry::from))
        .collect();
    sort_newest_first(&mut entries);
    entries
}

/// Income and outcome totals for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct MonthlySummary {
    /// 1 = January
    pub month: u32,
    pub income: i64,
    pub outcome: i64,
}

impl MonthlySummary {
    pub fn net(&self) -> i64 {
        self.income - self.outcome
    }
}

/// Twelve buckets, January through December, for entries dated in `year`.
pub fn monthly_summary<'a>(
    entries: impl IntoIterator<Item = &'a FinanceEntry>,
    year: i32,
) -> Vec<MonthlySummary> {
    let mut months: Vec<MonthlySummary> = (1..=12)
        .map(|month| MonthlySummary {
            month,
            income: 0,
            outcome: 0,
        })
        .collect();

    for entry in entries.into_iter().filter(|e| e.date.year() == year) {
        let bucket = &mut months[entry.date.month0() as usize];
        match entry.kind {
            FinanceKind::Income => bucket.income += entry.amount,
            FinanceKind::Expense => bucket.outcome += entry.amount,
        }
    }

    months
}
