//! Error types for the intake service.
//!
//! Only failures that can actually surface somewhere live here. Retry-cap
//! exhaustion and unrecognized form shapes are outcomes, not errors, and are
//! modelled by `server::webhooks::Outcome` and `intake::FormShape`.

use thiserror::Error;

/// Failure to turn a push delivery into a JSON payload.
///
/// Every variant is terminal: a malformed message never becomes well-formed on
/// redelivery, so the controller acknowledges and drops it.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("request body is not a push envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("push envelope has no 'message' field")]
    MissingMessage,

    #[error("push message has no message id")]
    MissingMessageId,

    #[error("push message {message_id} has no data")]
    MissingData { message_id: String },

    #[error("push message {message_id} data is not valid base64: {source}")]
    InvalidBase64 {
        message_id: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("push message {message_id} data is not valid JSON: {source}")]
    InvalidPayload {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A positional form schema is unreadable or inconsistent.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read form schema {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse form schema: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("column index {0} is mapped more than once")]
    DuplicateIndex(usize),

    #[error("column index {index} exceeds the maximum of {max}")]
    IndexOutOfRange { index: usize, max: usize },

    #[error("key '{0}' is mapped more than once")]
    DuplicateKey(String),

    #[error("form schema does not map required field '{0}'")]
    MissingField(&'static str),
}

/// AI profile generation failed.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("GenAI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GenAI returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GenAI response contained no text candidate")]
    EmptyResponse,

    #[error("failed to parse profile from GenAI response: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        preview: String,
    },
}

/// Sending a profile report failed.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("no sender address configured (set SENDER_EMAIL or SMTP_USERNAME)")]
    MissingSender,

    #[error("invalid mailbox '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("SMTP server rejected message: {0}")]
    Rejected(String),
}

/// Background processing of one intake job failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("profile generation failed: {0}")]
    Profile(#[from] ProfileError),

    #[error("report delivery failed after {attempts} attempt(s): {source}")]
    Email {
        attempts: u32,
        #[source]
        source: EmailError,
    },
}
