//! Pub/Sub push webhook.
//!
//! Each delivery attempt runs decode → retry check → normalize → dispatch and
//! is acknowledged with 204 whatever happens downstream. Malformed deliveries
//! and deliveries past the retry cap are acknowledged too, and dropped, since
//! redelivering them cannot help.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::error::EnvelopeError;
use crate::pipeline::IntakeJob;
use crate::pubsub;
use crate::server::AppState;

/// Why a delivery was acknowledged without processing.
#[derive(Debug)]
pub enum AbandonReason {
    /// Envelope or payload could not be decoded
    Decode(EnvelopeError),
    /// Earlier deliveries of this message id already used up the cap
    RetryExhausted { attempt: u32, max_attempts: u32 },
}

/// Terminal state of one delivery attempt.
#[derive(Debug)]
pub enum Outcome {
    /// Normalized and handed to background processing
    Acknowledged { message_id: String, attempt: u32 },
    /// Dropped without background processing
    Abandoned(AbandonReason),
}

/// Run one delivery through the acknowledgment state machine.
///
/// Performs no blocking I/O; downstream work is only scheduled.
pub fn process_delivery(state: &AppState, body: &[u8]) -> Outcome {
    let message = match pubsub::decode(body) {
        Ok(message) => message,
        Err(e) => return Outcome::Abandoned(AbandonReason::Decode(e)),
    };

    let max_attempts = state.max_endpoint_retries();
    let admission = state.tracker.admit(&message.message_id, max_attempts);
    if admission.exhausted {
        return Outcome::Abandoned(AbandonReason::RetryExhausted {
            attempt: admission.attempt,
            max_attempts,
        });
    }

    let normalized = state
        .normalizer
        .inspect(state.normalizer.classify(message.payload));
    tracing::debug!(
        "Message {} normalized from {:?} form ({} drift warning(s))",
        message.message_id,
        normalized.shape,
        normalized.drift.len()
    );

    state.dispatcher.dispatch(IntakeJob {
        message_id: message.message_id.clone(),
        attempt: admission.attempt,
        record: normalized.record,
        received_at: Utc::now(),
    });

    Outcome::Acknowledged {
        message_id: message.message_id,
        attempt: admission.attempt,
    }
}

/// Handle a Pub/Sub push delivery.
///
/// The body is read raw so that malformed envelopes reach the state machine
/// instead of being rejected by an extractor with a 4xx.
pub async fn handle_pubsub_push(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    match process_delivery(&state, &body) {
        Outcome::Acknowledged { message_id, attempt } => {
            tracing::info!(
                "Message {} accepted (attempt {}), processing in background",
                message_id,
                attempt
            );
        }
        Outcome::Abandoned(AbandonReason::Decode(e)) => {
            tracing::warn!("Dropping undecodable push delivery: {}", e);
        }
        Outcome::Abandoned(AbandonReason::RetryExhausted { attempt, max_attempts }) => {
            tracing::warn!(
                "Dropping redelivery {} of a message already attempted {} time(s)",
                attempt,
                max_attempts
            );
        }
    }

    StatusCode::NO_CONTENT
}

/// Describe the push endpoint.
pub async fn pubsub_webhook_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "endpoint": "/webhooks/pubsub",
        "method": "POST",
        "description": "Handles Pub/Sub push notifications with client form data",
        "max_endpoint_retries": state.max_endpoint_retries(),
    }))
}
