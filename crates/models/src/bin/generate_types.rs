//! Print TypeScript declarations for the API wire types.
//!
//! Usage: `generate-types [OUTPUT]` (stdout when no path is given).

use std::{env, fs};

use models::{
    client::{Client, ClientDraft, Media},
    expense::Expense,
    finance::{FinanceDraft, FinanceEntry, FinanceKind, MonthlySummary},
    income::Income,
    project::{Project, ProjectDraft, ProjectRef, ProjectStatus},
    resource::{DocumentId, ResourceKind},
    user::{LoginRequest, LoginResponse, User},
};
use ts_rs::TS;

fn main() -> std::io::Result<()> {
    let decls = [
        DocumentId::decl(),
        ResourceKind::decl(),
        Media::decl(),
        Client::decl(),
        ClientDraft::decl(),
        ProjectStatus::decl(),
        ProjectRef::decl(),
        Project::decl(),
        ProjectDraft::decl(),
        Income::decl(),
        Expense::decl(),
        FinanceKind::decl(),
        FinanceDraft::decl(),
        FinanceEntry::decl(),
        MonthlySummary::decl(),
        User::decl(),
        LoginRequest::decl(),
        LoginResponse::decl(),
    ];

    let output = decls
        .iter()
        .map(|decl| format!("export {decl}"))
        .collect::<Vec<_>>()
        .join("\n\n");

    match env::args().nth(1) {
        Some(path) => fs::write(path, output + "\n"),
        None => {
            println!("{output}");
            Ok(())
        }
    }
}
