use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    finance::FinanceDraft,
    project::ProjectRef,
    resource::{DocumentId, Resource, ResourceKind},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Expense {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
    pub amount: i64,
    pub description: Option<String>,
    #[serde(deserialize_with = "crate::date_format::deserialize")]
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub payment_method: Option<String>,
    pub project: Option<ProjectRef>,
}

impl Resource for Expense {
    const KIND: ResourceKind = ResourceKind::Expenses;
    type Draft = FinanceDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn document_id(&self) -> &DocumentId {
        &self.document_id
    }
}
