//! In-process stand-in for the content API, served on an ephemeral port.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Map, Value, json};
use services::{
    DashboardServices,
    services::{
        config::DashboardConfig,
        storage::{DurableStorage, MemoryStorage},
    },
};
use tokio::task::JoinHandle;
use url::Url;

pub const EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "secret123";
pub const TOKEN: &str = "fake-jwt-token";
pub const BAD_CREDENTIALS: &str = "Invalid identifier or password";

const COLLECTIONS: [&str; 4] = ["clients", "projects", "incomes", "expenses"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Debug, Default)]
struct CmsState {
    records: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicI64,
    requests: Mutex<Vec<RecordedRequest>>,
    tokens_revoked: AtomicBool,
}

pub struct FakeCms {
    pub url: Url,
    state: Arc<CmsState>,
    server: JoinHandle<()>,
}

impl Drop for FakeCms {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeCms {
    pub async fn start() -> Self {
        let state = Arc::new(CmsState::default());
        {
            let mut records = state.records.lock().unwrap();
            for collection in COLLECTIONS {
                records.insert(collection.to_string(), Vec::new());
            }
        }

        let app = Router::new()
            .route("/api/auth/local", post(login))
            .route("/api/{resource}", get(list).post(create))
            .route(
                "/api/{resource}/{document_id}",
                get(fetch).put(update).delete(remove),
            )
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}").parse().unwrap(),
            state,
            server,
        }
    }

    pub fn config(&self) -> DashboardConfig {
        DashboardConfig::new(self.url.clone(), PathBuf::from("unused-session.json"))
    }

    /// Fresh services with an empty in-memory session.
    pub fn services(&self) -> DashboardServices {
        DashboardServices::new(self.config(), Arc::new(MemoryStorage::new())).unwrap()
    }

    /// Services that are already logged in.
    pub fn logged_in_services(&self) -> DashboardServices {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("token", TOKEN).unwrap();
        DashboardServices::new(self.config(), storage).unwrap()
    }

    /// Insert a record directly, returning it as the API would.
    pub fn seed(&self, collection: &str, attributes: Value) -> Value {
        let mut records = self.state.records.lock().unwrap();
        let record = self.state.materialize(&records, collection, attributes);
        records
            .get_mut(collection)
            .expect("known collection")
            .push(record.clone());
        record
    }

    pub fn document_id(record: &Value) -> String {
        record["documentId"].as_str().unwrap().to_string()
    }

    pub fn stored(&self, collection: &str) -> Vec<Value> {
        self.state.records.lock().unwrap()[collection].clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().unwrap().clear();
    }

    /// Every bearer token is rejected from now on.
    pub fn revoke_tokens(&self) {
        self.state.tokens_revoked.store(true, Ordering::SeqCst);
    }
}

impl CmsState {
    /// Assign ids, trim strings and expand relation document ids.
    fn materialize(
        &self,
        records: &HashMap<String, Vec<Value>>,
        collection: &str,
        attributes: Value,
    ) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut record = normalize(records, attributes);
        record.insert("id".into(), json!(id));
        record.insert("documentId".into(), json!(format!("doc-{collection}-{id}")));
        if collection == "projects" {
            record
                .entry("project_status")
                .or_insert_with(|| json!("В очереди"));
        }
        Value::Object(record)
    }
}

fn normalize(records: &HashMap<String, Vec<Value>>, attributes: Value) -> Map<String, Value> {
    let Value::Object(attributes) = attributes else {
        return Map::new();
    };
    attributes
        .into_iter()
        .map(|(key, value)| {
            let value = match (key.as_str(), value) {
                ("client", Value::String(id)) => relation(records, "clients", &id),
                ("project", Value::String(id)) => relation(records, "projects", &id),
                (_, Value::String(s)) => Value::String(s.trim().to_string()),
                (_, other) => other,
            };
            (key, value)
        })
        .collect()
}

fn relation(records: &HashMap<String, Vec<Value>>, collection: &str, document_id: &str) -> Value {
    records[collection]
        .iter()
        .find(|r| r["documentId"] == document_id)
        .map(|r| json!({ "id": r["id"], "documentId": r["documentId"], "title": r["title"] }))
        .unwrap_or(Value::Null)
}

fn error(status: StatusCode, name: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "data": null,
            "error": { "status": status.as_u16(), "name": name, "message": message }
        })),
    )
        .into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "NotFoundError", "Not Found")
}

fn authorize(state: &CmsState, headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TOKEN}");
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented == Some(expected.as_str()) && !state.tokens_revoked.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(error(
            StatusCode::UNAUTHORIZED,
            "UnauthorizedError",
            "Missing or invalid credentials",
        ))
    }
}

async fn record_request(State(state): State<Arc<CmsState>>, req: Request, next: Next) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: req.method().clone(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
    });
    next.run(req).await
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["identifier"] == EMAIL && body["password"] == PASSWORD {
        Json(json!({
            "jwt": TOKEN,
            "user": { "id": 1, "username": "admin", "email": EMAIL }
        }))
        .into_response()
    } else {
        error(StatusCode::BAD_REQUEST, "ValidationError", BAD_CREDENTIALS)
    }
}

async fn list(
    State(state): State<Arc<CmsState>>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(res) = authorize(&state, &headers) {
        return res;
    }
    let records = state.records.lock().unwrap();
    let Some(all) = records.get(&resource) else {
        return not_found();
    };

    let page: usize = params
        .get("pagination[page]")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    let page_size: usize = params
        .get("pagination[pageSize]")
        .and_then(|v| v.parse().ok())
        .unwrap_or(25);
    let data: Vec<Value> = all
        .iter()
        .skip((page.max(1) - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    Json(json!({
        "data": data,
        "meta": { "pagination": {
            "page": page,
            "pageSize": page_size,
            "pageCount": all.len().div_ceil(page_size.max(1)),
            "total": all.len(),
        }}
    }))
    .into_response()
}

async fn fetch(
    State(state): State<Arc<CmsState>>,
    Path((resource, document_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(res) = authorize(&state, &headers) {
        return res;
    }
    let records = state.records.lock().unwrap();
    records
        .get(&resource)
        .and_then(|all| all.iter().find(|r| r["documentId"] == document_id.as_str()))
        .map(|r| Json(json!({ "data": r })).into_response())
        .unwrap_or_else(not_found)
}

async fn create(
    State(state): State<Arc<CmsState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(res) = authorize(&state, &headers) {
        return res;
    }
    let mut records = state.records.lock().unwrap();
    if !records.contains_key(&resource) {
        return not_found();
    }
    let record = state.materialize(&records, &resource, body["data"].clone());
    records
        .get_mut(&resource)
        .expect("checked above")
        .push(record.clone());
    Json(json!({ "data": record })).into_response()
}

async fn update(
    State(state): State<Arc<CmsState>>,
    Path((resource, document_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(res) = authorize(&state, &headers) {
        return res;
    }
    let mut records = state.records.lock().unwrap();
    let changes = normalize(&records, body["data"].clone());
    let Some(record) = records
        .get_mut(&resource)
        .and_then(|all| all.iter_mut().find(|r| r["documentId"] == document_id.as_str()))
    else {
        return not_found();
    };
    if let Value::Object(fields) = record {
        fields.extend(changes);
    }
    Json(json!({ "data": record })).into_response()
}

async fn remove(
    State(state): State<Arc<CmsState>>,
    Path((resource, document_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(res) = authorize(&state, &headers) {
        return res;
    }
    let mut records = state.records.lock().unwrap();
    let Some(all) = records.get_mut(&resource) else {
        return not_found();
    };
    let before = all.len();
    all.retain(|r| r["documentId"] != document_id.as_str());
    if all.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}
