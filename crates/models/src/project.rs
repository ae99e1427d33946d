use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use crate::{
    client::Client,
    expense::Expense,
    finance::{self, FinanceEntry},
    income::Income,
    resource::{DocumentId, Resource, ResourceKind},
};

/// Workflow stage of a project. Wire values are the labels the CMS stores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display, Default,
)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "В очереди")]
    #[strum(serialize = "В очереди")]
    Queued,
    #[serde(rename = "В работе")]
    #[strum(serialize = "В работе")]
    InProgress,
    #[serde(rename = "На проверке")]
    #[strum(serialize = "На проверке")]
    InReview,
    // The collection schema ships with this spelling; accept the corrected one on input.
    #[serde(rename = "Заверешен", alias = "Завершен")]
    #[strum(to_string = "Заверешен", serialize = "Завершен")]
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Queued,
        ProjectStatus::InProgress,
        ProjectStatus::InReview,
        ProjectStatus::Completed,
    ];
}

/// Minimal project reference embedded in income and expense records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProjectRef {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Project {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
    pub title: String,
    pub description: Option<String>,
    pub budget: Option<i64>,
    #[serde(default)]
    pub project_status: ProjectStatus,
    #[serde(default, deserialize_with = "crate::date_format::deserialize_option")]
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "crate::date_format::deserialize_option")]
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    pub client: Option<Client>,
}

impl Project {
    /// Income and expense records merged, newest first.
    pub fn finance_entries(&self) -> Vec<FinanceEntry> {
        finance::finance_entries(&self.incomes, &self.expenses)
    }

    /// Σ incomes − Σ expenses
    pub fn financial_total(&self) -> i64 {
        finance::calculate_total(&self.finance_entries())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct ProjectDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    /// Related client, addressed by its document id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<DocumentId>,
}

/// Prefill for the project edit form.
impl From<&Project> for ProjectDraft {
    fn from(project: &Project) -> Self {
        Self {
            title: Some(project.title.clone()),
            description: project.description.clone(),
            budget: project.budget,
            project_status: Some(project.project_status),
            start_date: project.start_date,
            end_date: project.end_date,
            client: project.client.as_ref().map(|c| c.document_id.clone()),
        }
    }
}

impl Resource for Project {
    const KIND: ResourceKind = ResourceKind::Projects;
    type Draft = ProjectDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn document_id(&self) -> &DocumentId {
        &self.document_id
    }
}
