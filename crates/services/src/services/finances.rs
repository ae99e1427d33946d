//! Merged income/expense listing, totals and guarded deletion.

use models::{
    finance::{self, FinanceEntry, FinanceKind, MonthlySummary},
    resource::DocumentId,
};
use serde::Serialize;

use super::{
    api_client::ApiError,
    confirmation::ConfirmationService,
    resource::{DeleteError, ExpenseService, IncomeService},
};

/// Both collections merged newest first, with the running balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    pub entries: Vec<FinanceEntry>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct FinanceService {
    incomes: IncomeService,
    expenses: ExpenseService,
    confirmations: ConfirmationService,
}

impl FinanceService {
    pub fn new(
        incomes: IncomeService,
        expenses: ExpenseService,
        confirmations: ConfirmationService,
    ) -> Self {
        Self {
            incomes,
            expenses,
            confirmations,
        }
    }

    /// First `page_size` incomes and expenses. `None` without a session.
    pub async fn ledger(&self, page_size: u32) -> Result<Option<Ledger>, ApiError> {
        let (incomes, expenses) = tokio::try_join!(
            self.incomes.list(1, page_size),
            self.expenses.list(1, page_size)
        )?;
        let (Some(incomes), Some(expenses)) = (incomes, expenses) else {
            return Ok(None);
        };

        let entries = finance::finance_entries(&incomes.items, &expenses.items);
        let total = finance::calculate_total(&entries);
        Ok(Some(Ledger { entries, total }))
    }

    pub async fn monthly_summary(
        &self,
        year: i32,
        page_size: u32,
    ) -> Result<Option<Vec<MonthlySummary>>, ApiError> {
        Ok(self
            .ledger(page_size)
            .await?
            .map(|ledger| finance::monthly_summary(&ledger.entries, year)))
    }

    /// Ask for confirmation, then delete. `Ok(None)` when the user declines.
    pub async fn delete_entry(
        &self,
        kind: FinanceKind,
        document_id: &DocumentId,
    ) -> Result<Option<DocumentId>, DeleteError> {
        match kind {
            FinanceKind::Income => {
                self.incomes
                    .delete_confirmed(&self.confirmations, document_id)
                    .await
            }
            FinanceKind::Expense => {
                self.expenses
                    .delete_confirmed(&self.confirmations, document_id)
                    .await
            }
        }
    }
}
