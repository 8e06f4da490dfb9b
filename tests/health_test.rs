//! Router-level tests for health, readiness and info endpoints

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use tower::ServiceExt;

use common::{config, get, json_body, state_with, RecordingDispatcher};
use interior_intake::intake::ColumnDef;
use interior_intake::{create_router, AppState, FormSchema, Normalizer};

const READY_ENV: &[(&str, &str)] = &[
    ("GEMINI_API_KEY", "test-key"),
    ("SMTP_USERNAME", "studio@example.com"),
    ("SMTP_PASSWORD", "hunter2"),
];

fn app(pairs: &[(&str, &str)]) -> axum::Router {
    create_router(state_with(config(pairs), Arc::new(RecordingDispatcher::default())))
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app(&[]);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let body = json_body(app.clone().oneshot(get("/health/liveness")).await.unwrap()).await;
    assert_eq!(body["status"], "alive");

    let body = json_body(app.oneshot(get("/health/startup")).await.unwrap()).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_readiness_unhealthy_without_collaborator_config() {
    let response = app(&[]).oneshot(get("/health/readiness")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["genai_config"], "unhealthy");
    assert_eq!(body["checks"]["email_config"], "unhealthy");
    assert_eq!(body["checks"]["configuration"], "healthy");
    assert_eq!(body["checks"]["environment"], "healthy");

    let unhealthy: Vec<&str> = body["unhealthy_services"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(unhealthy, vec!["email_config", "genai_config"]);
}

#[tokio::test]
async fn test_readiness_healthy_when_configured() {
    let response = app(READY_ENV).oneshot(get("/health/readiness")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body.get("unhealthy_services").is_none());
}

#[tokio::test]
async fn test_readiness_checks_loaded_form_schema() {
    let invalid = FormSchema {
        sequence_field: "values".to_string(),
        columns: vec![ColumnDef::new(0, "name")],
    };
    let state = Arc::new(AppState::new(
        config(READY_ENV),
        Normalizer::new(invalid),
        Arc::new(RecordingDispatcher::default()),
    ));

    let response = create_router(state).oneshot(get("/health/readiness")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["checks"]["configuration"], "unhealthy");
}

#[tokio::test]
async fn test_readiness_ignores_schema_file_after_startup() {
    let mut pairs = READY_ENV.to_vec();
    pairs.push(("FORM_SCHEMA_PATH", "/nonexistent/form_schema.yaml"));

    let response = app(&pairs).oneshot(get("/health/readiness")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["checks"]["configuration"], "healthy");
}

#[tokio::test]
async fn test_info_hides_secrets() {
    let response = app(READY_ENV).oneshot(get("/health/info")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["service"], "Interior AI Service");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["designer_email"], "designer@example.com");

    let rendered = body.to_string();
    assert!(!rendered.contains("hunter2"));
    assert!(!rendered.contains("test-key"));
}

#[tokio::test]
async fn test_root_reports_running() {
    let body = json_body(app(&[]).oneshot(get("/")).await.unwrap()).await;

    assert_eq!(body["status"], "running");
    assert_eq!(body["service"], "Interior AI Service");
}
