//! Form submission: validate locally, then create or update through the resource service.

use models::{
    client::{Client, ClientDraft},
    finance::{FinanceDraft, FinanceEntry, FinanceKind},
    project::{Project, ProjectDraft},
    resource::DocumentId,
};
use thiserror::Error;

use super::{
    api_client::ApiError,
    resource::{ClientService, ExpenseService, IncomeService, ProjectService},
    validation::{self, FieldErrors},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("validation failed: {0}")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FormError {
    /// Text for the form's error region.
    pub fn message(&self) -> String {
        match self {
            Self::Invalid(errors) => errors.to_string(),
            Self::Api(e) => e.user_message(),
        }
    }
}

pub async fn submit_client(clients: &ClientService, draft: &ClientDraft) -> Result<Client, FormError> {
    validation::validate_client(draft).map_err(FormError::Invalid)?;
    Ok(clients.create(draft).await?)
}

pub async fn submit_project(
    projects: &ProjectService,
    draft: &ProjectDraft,
) -> Result<Project, FormError> {
    validation::validate_project(draft).map_err(FormError::Invalid)?;
    Ok(projects.create(draft).await?)
}

/// Save the project edit form. The draft is the whole form, usually prefilled
/// from the record with `ProjectDraft::from`.
pub async fn update_project(
    projects: &ProjectService,
    document_id: &DocumentId,
    draft: &ProjectDraft,
) -> Result<Project, FormError> {
    validation::validate_project(draft).map_err(FormError::Invalid)?;
    Ok(projects.update(document_id, draft).await?)
}

/// The finance modal picks the collection with an income/expense switch.
pub async fn submit_finance(
    incomes: &IncomeService,
    expenses: &ExpenseService,
    kind: FinanceKind,
    draft: &FinanceDraft,
) -> Result<FinanceEntry, FormError> {
    validation::validate_finance(draft).map_err(FormError::Invalid)?;
    let entry = match kind {
        FinanceKind::Income => FinanceEntry::from(&incomes.create(draft).await?),
        FinanceKind::Expense => FinanceEntry::from(&expenses.create(draft).await?),
    };
    Ok(entry)
}
