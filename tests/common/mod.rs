//! In-process fake of the remote journal service.
//!
//! Speaks the same `{success, data | error}` envelopes as the real service
//! and records every request so tests can assert which calls were made.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use k9_journal_sync::{Config, HttpJournalClient};

#[derive(Debug, Default)]
pub struct FakeState {
    pub dogs: Vec<Value>,
    pub journals: Vec<Value>,
    pub next_id: i64,
    pub requests: Vec<(String, String)>,
    pub request_bodies: Vec<Value>,
    /// Raw `(status, body)` served for `GET /api/dogs` instead of the list.
    pub dogs_override: Option<(u16, String)>,
    pub dogs_delay: Option<Duration>,
    /// Raw `(status, body)` served for journal creates and updates.
    pub write_failure: Option<(u16, String)>,
    /// `(status, body)` served for every journal delete.
    pub delete_response: Option<(u16, Value)>,
    /// `(status, body)` served for the migration endpoint.
    pub migrate_response: Option<(u16, Value)>,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeService {
    pub base_url: String,
    pub state: Shared,
}

impl FakeService {
    pub async fn start() -> Self {
        Self::start_with(FakeState::default()).await
    }

    pub async fn start_with(mut state: FakeState) -> Self {
        if state.next_id == 0 {
            state.next_id = 100;
        }
        let state: Shared = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/api/dogs", get(list_dogs))
            .route("/api/journals", post(create_journal))
            .route("/api/journals/pending", get(list_pending))
            .route("/api/journals/approved", get(list_approved))
            .route("/api/journals/migrate-from-localstorage", post(migrate))
            .route("/api/journals/by-dog/:dog_id", get(journals_by_dog))
            .route(
                "/api/journals/:id",
                get(get_journal).put(update_journal).delete(delete_journal),
            )
            .route("/api/journals/:id/approve", post(approve_journal))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn client(&self) -> HttpJournalClient {
        HttpJournalClient::new(Config::for_base_url(&self.base_url)).unwrap()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.with_state(|s| s.requests.clone())
    }

    pub fn count(&self, method: &str, path_prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(m, p)| m == method && p.starts_with(path_prefix))
            .count()
    }

    pub fn journals(&self) -> Vec<Value> {
        self.with_state(|s| s.journals.clone())
    }

    pub fn last_body(&self) -> Option<Value> {
        self.with_state(|s| s.request_bodies.last().cloned())
    }
}

pub fn dog(id: i64, name: &str, trainer_id: Option<i64>) -> Value {
    json!({ "id": id, "name": name, "trainer_id": trainer_id, "chip_id": format!("CHIP-{}", id) })
}

pub fn journal(id: i64, dog_id: i64, date: &str) -> Value {
    json!({
        "id": id,
        "dog_id": dog_id,
        "trainer_id": 7,
        "journal_date": date,
        "training_activities": "Tuân lệnh; Phát hiện ma túy",
        "care_activities": "Sáng: Cho ăn; Tối: Tắm",
        "operation_activities": "Tuần tra cửa khẩu",
        "health_status": "Tốt",
        "behavior_notes": "",
        "weather_conditions": "Nắng",
        "challenges": null,
        "next_goals": "",
        "training_duration": 45,
        "success_rate": 80,
        "approval_status": "PENDING",
        "dog_name": "Rex",
        "trainer_name": "Nguyễn Văn A"
    })
}

async fn record_request(State(state): State<Shared>, req: Request, next: Next) -> Response {
    state
        .lock()
        .unwrap()
        .requests
        .push((req.method().to_string(), req.uri().path().to_string()));
    next.run(req).await
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Journal not found" })),
    )
        .into_response()
}

fn raw(status: u16, body: String) -> Response {
    (StatusCode::from_u16(status).unwrap(), body).into_response()
}

async fn list_dogs(State(state): State<Shared>) -> Response {
    let delay = state.lock().unwrap().dogs_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let s = state.lock().unwrap();
    match &s.dogs_override {
        Some((status, body)) => raw(*status, body.clone()),
        None => ok(Value::Array(s.dogs.clone())),
    }
}

async fn journals_by_dog(State(state): State<Shared>, Path(dog_id): Path<i64>) -> Response {
    let s = state.lock().unwrap();
    let found: Vec<Value> = s
        .journals
        .iter()
        .filter(|j| j["dog_id"] == dog_id)
        .cloned()
        .collect();
    Json(json!({ "success": true, "data": found, "total": found.len() })).into_response()
}

async fn get_journal(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let s = state.lock().unwrap();
    match s.journals.iter().find(|j| j["id"] == id) {
        Some(journal) => ok(journal.clone()),
        None => not_found(),
    }
}

async fn create_journal(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut s = state.lock().unwrap();
    s.request_bodies.push(body.clone());
    if let Some((status, text)) = s.write_failure.clone() {
        return raw(status, text);
    }
    let id = s.next_id;
    s.next_id += 1;
    body["id"] = json!(id);
    body["approval_status"] = json!("PENDING");
    s.journals.push(body.clone());
    ok(body)
}

async fn update_journal(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    s.request_bodies.push(body.clone());
    if let Some((status, text)) = s.write_failure.clone() {
        return raw(status, text);
    }
    match s.journals.iter_mut().find(|j| j["id"] == id) {
        Some(existing) => {
            body["id"] = json!(id);
            *existing = body.clone();
            ok(body)
        }
        None => not_found(),
    }
}

async fn delete_journal(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut s = state.lock().unwrap();
    if let Some((status, response)) = s.delete_response.clone() {
        return (StatusCode::from_u16(status).unwrap(), Json(response)).into_response();
    }
    let before = s.journals.len();
    s.journals.retain(|j| j["id"] != id);
    if s.journals.len() < before {
        Json(json!({ "success": true, "message": "Journal deleted successfully" })).into_response()
    } else {
        not_found()
    }
}

async fn approve_journal(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    s.request_bodies.push(body.clone());
    if body["approver_id"].is_null() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Approver ID is required" })),
        )
            .into_response();
    }
    match s.journals.iter_mut().find(|j| j["id"] == id) {
        Some(journal) => {
            let approved = body["approved"].as_bool().unwrap_or(true);
            journal["approval_status"] = json!(if approved { "APPROVED" } else { "REJECTED" });
            journal["approved_by"] = body["approver_id"].clone();
            journal["rejection_reason"] = body["rejection_reason"].clone();
            ok(journal.clone())
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "Journal not found" })),
        )
            .into_response(),
    }
}

fn by_status(state: &Shared, status: &str) -> Response {
    let s = state.lock().unwrap();
    let found: Vec<Value> = s
        .journals
        .iter()
        .filter(|j| j["approval_status"] == status)
        .cloned()
        .collect();
    ok(Value::Array(found))
}

async fn list_pending(State(state): State<Shared>) -> Response {
    by_status(&state, "PENDING")
}

async fn list_approved(State(state): State<Shared>) -> Response {
    by_status(&state, "APPROVED")
}

async fn migrate(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut s = state.lock().unwrap();
    s.request_bodies.push(body.clone());
    let submitted = body["journals"].as_array().map(Vec::len).unwrap_or(0);
    match s.migrate_response.clone() {
        Some((status, response)) => {
            (StatusCode::from_u16(status).unwrap(), Json(response)).into_response()
        }
        None => Json(json!({
            "success": true,
            "migrated_count": submitted,
            "total_journals": submitted,
            "errors": []
        }))
        .into_response(),
    }
}
