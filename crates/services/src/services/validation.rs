//! Field checks run before a form reaches the network.

use std::fmt;

use models::{client::ClientDraft, finance::FinanceDraft, project::ProjectDraft};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

pub const INVALID_EMAIL: &str = "Invalid email address.";
pub const EMAIL_TOO_SHORT: &str = "Email must be at least 2 characters.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters.";
pub const PROJECT_TITLE_TOO_SHORT: &str = "Название проекта должно содержать минимум 3 символа.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failed field of one form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn validate_login(identifier: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let identifier = identifier.trim();

    if !is_email(identifier) {
        errors.add("identifier", INVALID_EMAIL);
    } else if identifier.chars().count() < 2 {
        errors.add("identifier", EMAIL_TOO_SHORT);
    }
    if password.chars().count() < 6 {
        errors.add("password", PASSWORD_TOO_SHORT);
    }
    errors.into_result()
}

pub fn validate_client(draft: &ClientDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if blank(draft.title.as_deref()) {
        errors.add("title", "Title is required.");
    }
    if let Some(email) = draft.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !is_email(email) {
            errors.add("email", INVALID_EMAIL);
        }
    }
    errors.into_result()
}

pub fn validate_project(draft: &ProjectDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let title_len = draft.title.as_deref().map_or(0, |t| t.trim().chars().count());
    if title_len < 3 {
        errors.add("title", PROJECT_TITLE_TOO_SHORT);
    }
    if draft.budget.is_some_and(|b| b < 0) {
        errors.add("budget", "Budget cannot be negative.");
    }
    if let (Some(start), Some(end)) = (draft.start_date, draft.end_date) {
        if end < start {
            errors.add("end_date", "End date cannot be before the start date.");
        }
    }
    errors.into_result()
}

pub fn validate_finance(draft: &FinanceDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if blank(draft.description.as_deref()) {
        errors.add("description", "Description is required.");
    }
    match draft.amount {
        Some(amount) if amount > 0 => {}
        _ => errors.add("amount", "Amount must be greater than zero."),
    }
    if draft.date.is_none() {
        errors.add("date", "Date is required.");
    }
    errors.into_result()
}

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
