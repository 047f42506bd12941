//! In-process stand-in for the FusionBrain and Gemini HTTP APIs.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use commit_chart::DailyCount;
use serde_json::{json, Value};

pub struct FakeApi {
    pub availability: Value,
    pub pipelines: Value,
    pub run_response: Value,
    /// Replies to successive status queries; the last one repeats.
    pub statuses: Mutex<VecDeque<(StatusCode, Value)>>,
    pub gemini_reply: (StatusCode, Value),
    pub status_polls: AtomicUsize,
    /// Job ids as decoded from the status route path.
    pub status_ids: Mutex<Vec<String>>,
    pub gemini_calls: AtomicUsize,
    pub submissions: Mutex<Vec<String>>,
    pub auth_seen: Mutex<Vec<(String, String)>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        FakeApi {
            availability: json!({"pipeline_status": "ENABLED"}),
            pipelines: json!([{"id": "p1", "name": "Kandinsky", "type": "TEXT2IMAGE"}]),
            run_response: json!({"uuid": "j1", "status": "INITIAL"}),
            statuses: Mutex::new(VecDeque::from(vec![done(&["aGk="])])),
            gemini_reply: (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "not configured"})),
            status_polls: AtomicUsize::new(0),
            status_ids: Mutex::new(Vec::new()),
            gemini_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            auth_seen: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn with_statuses(mut self, replies: Vec<(StatusCode, Value)>) -> Self {
        self.statuses = Mutex::new(VecDeque::from(replies));
        self
    }

    pub fn polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }
}

pub fn pending(status: &str) -> (StatusCode, Value) {
    (StatusCode::OK, json!({"uuid": "j1", "status": status}))
}

pub fn done(files: &[&str]) -> (StatusCode, Value) {
    (StatusCode::OK, json!({"uuid": "j1", "status": "DONE", "result": {"files": files, "censored": false}}))
}

pub fn failed(description: &str) -> (StatusCode, Value) {
    (StatusCode::OK, json!({"uuid": "j1", "status": "FAIL", "errorDescription": description}))
}

fn record_auth(api: &FakeApi, headers: &HeaderMap) {
    let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
    api.auth_seen.lock().unwrap().push((get("x-key"), get("x-secret")));
}

async fn availability(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Json<Value> {
    record_auth(&api, &headers);
    Json(api.availability.clone())
}

async fn pipelines(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Json<Value> {
    record_auth(&api, &headers);
    Json(api.pipelines.clone())
}

async fn run(State(api): State<Arc<FakeApi>>, headers: HeaderMap, body: String) -> Json<Value> {
    record_auth(&api, &headers);
    api.submissions.lock().unwrap().push(body);
    Json(api.run_response.clone())
}

async fn status(State(api): State<Arc<FakeApi>>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    api.status_polls.fetch_add(1, Ordering::SeqCst);
    api.status_ids.lock().unwrap().push(id);
    let mut queue = api.statuses.lock().unwrap();
    let reply = if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    };
    let (code, body) = reply.unwrap_or_else(|| pending("PROCESSING"));
    (code, Json(body))
}

async fn gemini(State(api): State<Arc<FakeApi>>, Path(_model): Path<String>) -> (StatusCode, Json<Value>) {
    api.gemini_calls.fetch_add(1, Ordering::SeqCst);
    let (code, body) = api.gemini_reply.clone();
    (code, Json(body))
}

/// Serve `api` on an ephemeral port and return its base URL.
pub async fn spawn(api: Arc<FakeApi>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/key/api/v1/pipeline/availability", get(availability))
        .route("/key/api/v1/pipelines", get(pipelines))
        .route("/key/api/v1/pipeline/run", post(run))
        .route("/key/api/v1/pipeline/status/:id", get(status))
        .route("/v1beta/models/:model", post(gemini))
        .with_state(api);
    let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
    tokio::spawn(server);
    format!("http://{}", addr)
}

/// 2024-01-01 ..= 2024-01-07 with the given counts.
pub fn week(counts: [u32; 7]) -> Vec<DailyCount> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    counts
        .iter()
        .enumerate()
        .map(|(i, &c)| DailyCount::new(start + chrono::Duration::days(i as i64), c))
        .collect()
}
