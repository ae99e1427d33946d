mod common;

use axum::http::Method;
use common::FakeCms;
use models::{
    envelope::Page,
    project::{Project, ProjectDraft, ProjectStatus},
    resource::{DocumentId, ResourceKind},
};
use serde_json::json;
use services::services::{
    cache::CacheKey,
    confirmation::{ConfirmationService, PendingConfirmation},
    forms::{self, FormError},
    validation::PROJECT_TITLE_TOO_SHORT,
};

async fn wait_for_dialog(confirmations: &ConfirmationService) -> PendingConfirmation {
    let mut rx = confirmations.subscribe();
    let pending = rx.wait_for(|p| p.is_some()).await.unwrap().clone();
    pending.unwrap()
}

fn seed_project(cms: &FakeCms) -> (DocumentId, DocumentId) {
    let client = cms.seed("clients", json!({ "title": "Acme", "email": "acme@example.com" }));
    let client_id = FakeCms::document_id(&client);
    let project = cms.seed(
        "projects",
        json!({
            "title": "Редизайн сайта",
            "budget": 500000,
            "project_status": "В работе",
            "start_date": "2025-01-10",
            "client": &client_id,
        }),
    );
    (
        DocumentId::new(FakeCms::document_id(&project)),
        DocumentId::new(client_id),
    )
}

#[tokio::test]
async fn edit_form_saves_the_new_status() {
    let cms = FakeCms::start().await;
    let (project_id, client_id) = seed_project(&cms);
    let app = cms.logged_in_services();
    app.projects.list(1, 25).await.unwrap();

    let current = app.projects.get(&project_id).await.unwrap().unwrap();
    let draft = ProjectDraft {
        project_status: Some(ProjectStatus::Completed),
        ..ProjectDraft::from(&current)
    };
    let updated = forms::update_project(&app.projects, &project_id, &draft)
        .await
        .unwrap();

    assert_eq!(updated.project_status, ProjectStatus::Completed);
    assert_eq!(updated.title, "Редизайн сайта");
    assert_eq!(updated.budget, Some(500000));
    assert_eq!(updated.client.map(|c| c.document_id), Some(client_id));

    let stored = cms.stored("projects");
    assert_eq!(stored[0]["project_status"], "Заверешен");
    assert_eq!(cms.count(Method::PUT, &format!("/api/projects/{project_id}")), 1);

    let list_key = CacheKey::list(ResourceKind::Projects, 1, 25);
    assert!(app.cache.peek::<Page<Project>>(&list_key).await.unwrap().stale);
    let refreshed = app.projects.list(1, 25).await.unwrap().unwrap();
    assert_eq!(refreshed.items[0].project_status, ProjectStatus::Completed);
}

#[tokio::test]
async fn edit_form_rejects_a_short_title_locally() {
    let cms = FakeCms::start().await;
    let (project_id, _) = seed_project(&cms);
    let app = cms.logged_in_services();

    let current = app.projects.get(&project_id).await.unwrap().unwrap();
    let draft = ProjectDraft {
        title: Some("ab".into()),
        ..ProjectDraft::from(&current)
    };
    let err = forms::update_project(&app.projects, &project_id, &draft)
        .await
        .unwrap_err();

    let fields = match err {
        FormError::Invalid(fields) => fields,
        other => panic!("expected a validation failure, got {other:?}"),
    };
    assert_eq!(fields.get("title"), Some(PROJECT_TITLE_TOO_SHORT));
    assert_eq!(cms.count(Method::PUT, &format!("/api/projects/{project_id}")), 0);
}

#[tokio::test]
async fn add_project_form_links_the_client() {
    let cms = FakeCms::start().await;
    let (_, client_id) = seed_project(&cms);
    let app = cms.logged_in_services();

    let draft = ProjectDraft {
        title: Some("  Мобильное приложение ".into()),
        client: Some(client_id.clone()),
        ..Default::default()
    };
    let created = forms::submit_project(&app.projects, &draft).await.unwrap();

    assert_eq!(created.title, "Мобильное приложение");
    assert_eq!(created.project_status, ProjectStatus::Queued);
    assert_eq!(created.client.map(|c| c.title), Some("Acme".to_string()));
    assert_eq!(cms.stored("projects").len(), 2);
}

#[tokio::test]
async fn declined_project_delete_sends_nothing() {
    let cms = FakeCms::start().await;
    let (project_id, _) = seed_project(&cms);
    let app = cms.logged_in_services();

    let projects = app.projects.clone();
    let confirmations = app.confirmations.clone();
    let id = project_id.clone();
    let task = tokio::spawn(async move { projects.delete_confirmed(&confirmations, &id).await });

    let pending = wait_for_dialog(&app.confirmations).await;
    assert_eq!(pending.options.title, "Удаление проекта");
    assert_eq!(pending.options.confirm_label, "Удалить");
    app.confirmations.cancel().unwrap();

    assert_eq!(task.await.unwrap().unwrap(), None);
    assert_eq!(cms.count(Method::DELETE, &format!("/api/projects/{project_id}")), 0);
    assert_eq!(cms.stored("projects").len(), 1);
}

#[tokio::test]
async fn accepted_client_delete_removes_it_once() {
    let cms = FakeCms::start().await;
    let (_, client_id) = seed_project(&cms);
    let app = cms.logged_in_services();
    app.clients.get(&client_id).await.unwrap();

    let clients = app.clients.clone();
    let confirmations = app.confirmations.clone();
    let id = client_id.clone();
    let task = tokio::spawn(async move { clients.delete_confirmed(&confirmations, &id).await });

    let pending = wait_for_dialog(&app.confirmations).await;
    assert_eq!(pending.options.title, "Удаление клиента");
    app.confirmations.confirm().unwrap();

    assert_eq!(task.await.unwrap().unwrap(), Some(client_id.clone()));
    assert_eq!(cms.requests().iter().filter(|r| r.method == Method::DELETE).count(), 1);
    assert!(cms.stored("clients").is_empty());

    let err = app.clients.get(&client_id).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err:?}");
}
