mod common;

use axum::http::Method;
use chrono::NaiveDate;
use common::FakeCms;
use models::{
    finance::{FinanceDraft, FinanceKind},
    project::ProjectStatus,
    resource::DocumentId,
};
use serde_json::json;
use services::services::{
    confirmation::{ConfirmationService, PendingConfirmation},
    forms::{self, FormError},
};

async fn wait_for_dialog(confirmations: &ConfirmationService) -> PendingConfirmation {
    let mut rx = confirmations.subscribe();
    let pending = rx.wait_for(|p| p.is_some()).await.unwrap().clone();
    pending.unwrap()
}

fn seed_ledger(cms: &FakeCms) -> (String, String) {
    let income = cms.seed(
        "incomes",
        json!({ "amount": 100, "description": "Предоплата", "date": "2024-03-01", "payment_method": "card" }),
    );
    cms.seed(
        "incomes",
        json!({ "amount": 250, "description": "Финальный платеж", "date": "2024-05-20T10:00:00.000Z" }),
    );
    let expense = cms.seed(
        "expenses",
        json!({ "amount": 40, "description": "Хостинг", "date": "2024-03-01" }),
    );
    cms.seed(
        "expenses",
        json!({ "amount": 10, "description": "Домен", "date": "2024-01-15" }),
    );
    (FakeCms::document_id(&income), FakeCms::document_id(&expense))
}

#[tokio::test]
async fn ledger_is_merged_newest_first_with_total() {
    let cms = FakeCms::start().await;
    seed_ledger(&cms);
    let app = cms.logged_in_services();

    let ledger = app.finances.ledger(100).await.unwrap().unwrap();

    let descriptions: Vec<&str> = ledger
        .entries
        .iter()
        .map(|e| e.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec!["Финальный платеж", "Предоплата", "Хостинг", "Домен"]
    );
    assert_eq!(ledger.total, 300);
}

#[tokio::test]
async fn monthly_summary_buckets_by_month() {
    let cms = FakeCms::start().await;
    seed_ledger(&cms);
    let app = cms.logged_in_services();

    let months = app.finances.monthly_summary(2024, 100).await.unwrap().unwrap();

    assert_eq!(months.len(), 12);
    assert_eq!((months[0].income, months[0].outcome), (0, 10));
    assert_eq!((months[2].income, months[2].outcome), (100, 40));
    assert_eq!(months[4].net(), 250);
    assert!(app.finances.monthly_summary(2023, 100).await.unwrap().unwrap().iter().all(|m| m.income == 0 && m.outcome == 0));
}

#[tokio::test]
async fn declined_confirmation_deletes_nothing() {
    let cms = FakeCms::start().await;
    let (income_id, _) = seed_ledger(&cms);
    let app = cms.logged_in_services();

    let finances = app.finances.clone();
    let id = DocumentId::new(income_id.clone());
    let task = tokio::spawn(async move { finances.delete_entry(FinanceKind::Income, &id).await });

    let pending = wait_for_dialog(&app.confirmations).await;
    assert_eq!(pending.options.title, "Удаление записи о расчете");
    assert_eq!(pending.options.confirm_label, "Удалить");
    assert_eq!(pending.options.cancel_label, "Отмена");
    app.confirmations.cancel().unwrap();

    assert_eq!(task.await.unwrap().unwrap(), None);
    assert_eq!(cms.count(Method::DELETE, &format!("/api/incomes/{income_id}")), 0);
    assert_eq!(cms.stored("incomes").len(), 2);
}

#[tokio::test]
async fn accepted_confirmation_deletes_exactly_once() {
    let cms = FakeCms::start().await;
    let (_, expense_id) = seed_ledger(&cms);
    let app = cms.logged_in_services();
    app.finances.ledger(100).await.unwrap();

    let finances = app.finances.clone();
    let id = DocumentId::new(expense_id.clone());
    let task = tokio::spawn(async move { finances.delete_entry(FinanceKind::Expense, &id).await });

    wait_for_dialog(&app.confirmations).await;
    app.confirmations.confirm().unwrap();

    let deleted = task.await.unwrap().unwrap();
    assert_eq!(deleted, Some(DocumentId::new(expense_id.clone())));
    assert_eq!(cms.requests().iter().filter(|r| r.method == Method::DELETE).count(), 1);
    assert_eq!(cms.stored("expenses").len(), 1);

    let ledger = app.finances.ledger(100).await.unwrap().unwrap();
    assert_eq!(ledger.entries.len(), 3);
    assert_eq!(ledger.total, 340);
}

#[tokio::test]
async fn finance_form_creates_income_linked_to_project() {
    let cms = FakeCms::start().await;
    let project = cms.seed("projects", json!({ "title": "CRM", "budget": 50000 }));
    let project_id = DocumentId::new(FakeCms::document_id(&project));
    let app = cms.logged_in_services();

    let draft = FinanceDraft {
        amount: Some(1_860_000),
        description: Some("Оплата этапа".into()),
        date: NaiveDate::from_ymd_opt(2024, 6, 1),
        payment_method: Some("transfer".into()),
        project: Some(project_id.clone()),
    };
    let entry = forms::submit_finance(&app.incomes, &app.expenses, FinanceKind::Income, &draft)
        .await
        .unwrap();
    assert_eq!(entry.kind, FinanceKind::Income);
    assert_eq!(entry.signed_amount(), 1_860_000);

    let income = app.incomes.get(&entry.document_id).await.unwrap().unwrap();
    let linked = income.project.unwrap();
    assert_eq!(linked.document_id, project_id);
    assert_eq!(linked.title, "CRM");

    let invalid = FinanceDraft {
        amount: Some(-5),
        ..draft
    };
    let err = forms::submit_finance(&app.incomes, &app.expenses, FinanceKind::Expense, &invalid)
        .await
        .unwrap_err();
    assert!(matches!(err, FormError::Invalid(_)));
    assert_eq!(cms.count(Method::POST, "/api/expenses"), 0);
}

#[tokio::test]
async fn project_total_comes_from_populated_finances() {
    let cms = FakeCms::start().await;
    let project = cms.seed(
        "projects",
        json!({
            "title": "Landing",
            "project_status": "Заверешен",
            "incomes": [
                { "id": 1, "documentId": "i1", "amount": 500, "date": "2024-02-01" },
                { "id": 2, "documentId": "i2", "amount": 300, "date": "2024-02-10" }
            ],
            "expenses": [
                { "id": 3, "documentId": "e1", "amount": 120, "date": "2024-02-05" }
            ]
        }),
    );
    let app = cms.logged_in_services();

    let project = app
        .projects
        .get(&DocumentId::new(FakeCms::document_id(&project)))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(project.project_status, ProjectStatus::Completed);
    assert_eq!(project.financial_total(), 680);
    assert_eq!(project.finance_entries()[0].document_id, DocumentId::new("i2"));
}
