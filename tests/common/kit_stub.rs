//! In-process stub of the Kit API for integration tests.
//!
//! Serves the handful of endpoints the adapter talks to, with
//! per-test configurable behavior, and records every call it receives
//! as "METHOD /path" strings so tests can assert on call order and
//! absence of calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A custom field known to the stub provider.
#[derive(Debug, Clone)]
pub struct StubField {
    pub id: u64,
    pub name: String,
    pub key: Option<String>,
}

/// Configurable behavior, adjusted per test through [`KitStub::behavior`].
#[derive(Debug, Clone)]
pub struct StubBehavior {
    /// Existing tags returned by GET /tags
    pub tags: Vec<(u64, String)>,
    /// Status for GET /tags (e.g. 500 to force the create fallthrough)
    pub list_tags_status: u16,
    /// Id assigned to the next created tag
    pub next_tag_id: u64,
    /// Existing custom fields returned by GET /custom_fields
    pub fields: Vec<StubField>,
    /// Id assigned to the next created field
    pub next_field_id: u64,
    /// Status for POST /subscribers
    pub create_subscriber_status: u16,
    /// Subscriber id in a successful create response; None omits the body
    pub create_subscriber_id: Option<u64>,
    /// Error message returned on a failed create
    pub create_subscriber_error: String,
    /// Subscriber ids returned by GET /subscribers lookups
    pub lookup_ids: Vec<u64>,
    /// Status for PUT /subscribers/:id
    pub update_fields_status: u16,
    /// Status for POST /tags/:tag/subscribers/:sub
    pub tag_apply_status: u16,
}

impl Default for StubBehavior {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            list_tags_status: 200,
            next_tag_id: 42,
            fields: Vec::new(),
            next_field_id: 500,
            create_subscriber_status: 201,
            create_subscriber_id: Some(7),
            create_subscriber_error: "Email address already exists".to_string(),
            lookup_ids: Vec::new(),
            update_fields_status: 200,
            tag_apply_status: 200,
        }
    }
}

#[derive(Clone)]
struct StubState {
    behavior: Arc<Mutex<StubBehavior>>,
    calls: Arc<Mutex<Vec<String>>>,
}

/// A running stub provider bound to an ephemeral port.
pub struct KitStub {
    pub base_url: String,
    behavior: Arc<Mutex<StubBehavior>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl KitStub {
    pub async fn start() -> Self {
        let behavior = Arc::new(Mutex::new(StubBehavior::default()));
        let calls = Arc::new(Mutex::new(Vec::new()));

        let state = StubState {
            behavior: behavior.clone(),
            calls: calls.clone(),
        };

        let app = Router::new()
            .route("/tags", get(list_tags).post(create_tag))
            .route("/custom_fields", get(list_fields).post(create_field))
            .route("/subscribers", get(lookup_subscribers).post(create_subscriber))
            .route("/subscribers/:id", put(update_subscriber))
            .route("/tags/:tag_id/subscribers/:subscriber_id", post(tag_subscriber))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            behavior,
            calls,
        }
    }

    /// Mutate the stub's behavior for the next calls.
    pub fn configure<F: FnOnce(&mut StubBehavior)>(&self, f: F) {
        f(&mut self.behavior.lock().unwrap());
    }

    /// All recorded calls, in order, as "METHOD /path" strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose "METHOD /path" starts with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

fn record(state: &StubState, entry: String) {
    state.calls.lock().unwrap().push(entry);
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn list_tags(State(state): State<StubState>) -> Response {
    record(&state, "GET /tags".to_string());
    let behavior = state.behavior.lock().unwrap().clone();

    if behavior.list_tags_status >= 300 {
        return (status(behavior.list_tags_status), Json(json!({}))).into_response();
    }

    let tags: Vec<Value> = behavior
        .tags
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();
    Json(json!({ "tags": tags })).into_response()
}

async fn create_tag(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /tags".to_string());
    let mut behavior = state.behavior.lock().unwrap();

    let name = body["name"].as_str().unwrap_or_default().to_string();
    let id = behavior.next_tag_id;
    behavior.next_tag_id += 1;
    behavior.tags.push((id, name.clone()));

    (
        StatusCode::CREATED,
        Json(json!({ "tag": { "id": id, "name": name } })),
    )
        .into_response()
}

async fn list_fields(State(state): State<StubState>) -> Response {
    record(&state, "GET /custom_fields".to_string());
    let behavior = state.behavior.lock().unwrap().clone();

    let fields: Vec<Value> = behavior
        .fields
        .iter()
        .map(|f| json!({ "id": f.id, "name": f.name, "label": f.name, "key": f.key }))
        .collect();
    Json(json!({ "custom_fields": fields })).into_response()
}

async fn create_field(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /custom_fields".to_string());
    let mut behavior = state.behavior.lock().unwrap();

    let name = body["name"].as_str().unwrap_or_default().to_string();
    let key = body["key"].as_str().unwrap_or_default().to_string();
    let id = behavior.next_field_id;
    behavior.next_field_id += 1;
    behavior.fields.push(StubField {
        id,
        name: name.clone(),
        key: Some(key.clone()),
    });

    (
        StatusCode::CREATED,
        Json(json!({ "custom_field": { "id": id, "name": name, "label": name, "key": key } })),
    )
        .into_response()
}

async fn create_subscriber(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /subscribers".to_string());
    let behavior = state.behavior.lock().unwrap().clone();

    // Echo the submitted fields into the call log so tests can check what
    // the adapter sent at creation time.
    if let Some(fields) = body.get("fields").and_then(Value::as_object) {
        for (key, value) in fields {
            record(
                &state,
                format!("  fields[{}]={}", key, value.as_str().unwrap_or_default()),
            );
        }
    }

    if behavior.create_subscriber_status >= 300 {
        return (
            status(behavior.create_subscriber_status),
            Json(json!({ "errors": [behavior.create_subscriber_error] })),
        )
            .into_response();
    }

    let body = match behavior.create_subscriber_id {
        Some(id) => json!({ "subscriber": { "id": id } }),
        None => json!({}),
    };
    (status(behavior.create_subscriber_status), Json(body)).into_response()
}

async fn lookup_subscribers(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let email = params.get("email_address").cloned().unwrap_or_default();
    record(&state, format!("GET /subscribers?email_address={}", email));
    let behavior = state.behavior.lock().unwrap().clone();

    let subscribers: Vec<Value> = behavior
        .lookup_ids
        .iter()
        .map(|id| json!({ "id": id }))
        .collect();
    Json(json!({ "subscribers": subscribers })).into_response()
}

async fn update_subscriber(
    State(state): State<StubState>,
    Path(id): Path<String>,
    Json(_body): Json<Value>,
) -> Response {
    record(&state, format!("PUT /subscribers/{}", id));
    let behavior = state.behavior.lock().unwrap().clone();

    if behavior.update_fields_status >= 300 {
        return (
            status(behavior.update_fields_status),
            Json(json!({ "errors": ["Failed to save the phone number"] })),
        )
            .into_response();
    }
    (status(behavior.update_fields_status), Json(json!({}))).into_response()
}

async fn tag_subscriber(
    State(state): State<StubState>,
    Path((tag_id, subscriber_id)): Path<(String, String)>,
) -> Response {
    record(
        &state,
        format!("POST /tags/{}/subscribers/{}", tag_id, subscriber_id),
    );
    let behavior = state.behavior.lock().unwrap().clone();

    if behavior.tag_apply_status >= 300 {
        return (
            status(behavior.tag_apply_status),
            Json(json!({ "errors": ["Could not tag subscriber"] })),
        )
            .into_response();
    }
    (status(behavior.tag_apply_status), Json(json!({}))).into_response()
}
