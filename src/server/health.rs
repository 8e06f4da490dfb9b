//! Health, readiness and service info endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::AppState;

const SERVICE: &str = "interior-intake";

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: CheckStatus,
    pub service: &'static str,
    pub checks: BTreeMap<&'static str, CheckStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unhealthy_services: Vec<&'static str>,
}

/// Health check endpoint (liveness)
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn liveness_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "service": SERVICE,
    }))
}

pub async fn startup_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ready",
        "service": SERVICE,
    }))
}

/// Evaluate whether downstream collaborators are configured.
///
/// The form schema check looks at the table the normalizer is running with,
/// not at the file on disk.
pub fn readiness(state: &AppState) -> ReadinessResponse {
    let config = &state.config;
    let check = |ok: bool| if ok { CheckStatus::Healthy } else { CheckStatus::Unhealthy };

    let mut checks = BTreeMap::new();
    let schema_valid = state.normalizer.schema().validate().is_ok();
    checks.insert(
        "configuration",
        check(!config.designer_email.is_empty() && schema_valid),
    );
    checks.insert("genai_config", check(config.genai_ready()));
    checks.insert("email_config", check(config.email_ready()));
    // ENVIRONMENT is rejected at load time if invalid
    checks.insert("environment", CheckStatus::Healthy);

    let unhealthy_services: Vec<&'static str> = checks
        .iter()
        .filter(|(_, status)| **status == CheckStatus::Unhealthy)
        .map(|(name, _)| *name)
        .collect();

    ReadinessResponse {
        status: check(unhealthy_services.is_empty()),
        service: SERVICE,
        checks,
        unhealthy_services,
    }
}

/// Readiness check endpoint - verifies collaborator configuration
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let response = readiness(&state);
    let status = match response.status {
        CheckStatus::Healthy => StatusCode::OK,
        CheckStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(response))
}

/// Non-secret configuration summary.
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = &state.config;
    Json(serde_json::json!({
        "service": config.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment,
        "log_level": config.log_level,
        "genai_model": config.genai.model,
        "smtp_server": config.smtp.server,
        "smtp_port": config.smtp.port,
        "designer_email": config.designer_email,
        "max_endpoint_retries": config.max_endpoint_retries,
        "tracked_messages": state.tracker.len(),
        "form_columns": state.normalizer.schema().columns.len(),
    }))
}

pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": state.config.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "status": "running",
    }))
}
