//! Shared fixtures for router-level tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;

use interior_intake::{AppState, Dispatcher, IntakeJob, Normalizer, ServiceConfig};

/// Dispatcher that records jobs instead of running them.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub jobs: Mutex<Vec<IntakeJob>>,
}

impl RecordingDispatcher {
    pub fn count(&self) -> usize {
        self.jobs.lock().len()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, job: IntakeJob) {
        self.jobs.lock().push(job);
    }
}

pub fn config(pairs: &[(&str, &str)]) -> ServiceConfig {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("DESIGNER_EMAIL".to_string(), "designer@example.com".to_string());
    for (key, value) in pairs {
        vars.insert(key.to_string(), value.to_string());
    }
    ServiceConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn state_with(
    config: ServiceConfig,
    dispatcher: Arc<dyn Dispatcher>,
) -> Arc<AppState> {
    Arc::new(AppState::new(config, Normalizer::default(), dispatcher))
}

/// Push envelope around a JSON payload.
pub fn push_body(message_id: &str, payload: &serde_json::Value) -> String {
    serde_json::json!({
        "message": {
            "data": STANDARD.encode(payload.to_string()),
            "messageId": message_id,
            "publishTime": "2024-05-01T12:00:00Z",
            "attributes": {"source": "forms"},
        },
        "subscription": "projects/interior/subscriptions/intake-push",
    })
    .to_string()
}

/// Push envelope whose `data` is already-encoded text.
pub fn raw_push_body(message_id: &str, data: &str) -> String {
    serde_json::json!({
        "message": {"data": data, "messageId": message_id},
        "subscription": "projects/interior/subscriptions/intake-push",
    })
    .to_string()
}

pub fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
