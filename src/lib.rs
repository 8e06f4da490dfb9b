//! # Interior Intake: Pub/Sub push webhook for client intake forms
//!
//! Receives Google Pub/Sub push deliveries carrying interior-design intake
//! form submissions, normalizes them into a canonical client record and hands
//! them to background processing that generates an AI design profile and
//! emails it to the designer.
//!
//! ## Features
//!
//! - **Push envelope decoding**: base64 `message.data` decoded into JSON
//! - **Form normalization**: positional value lists and keyed field maps map to one `ClientRecord`
//! - **Bounded retry tracking**: a message id reaches downstream processing at most `MAX_ENDPOINT_RETRIES` times
//! - **Fast acknowledgment**: every delivery is answered with 204, downstream work never blocks the response
//! - **Background pipeline**: Gemini profile generation, HTML/text report rendering, SMTP delivery with retry
//!
//! ## Example: positional form schema
//!
//! ```yaml
//! sequence_field: values
//! columns:
//!   - index: 1
//!     key: email
//!   - index: 3
//!     key: name
//!   - index: 6
//!     key: rooms
//! ```

// Configuration and errors
pub mod config;
pub mod error;

// Inbound path: envelope decoding, retry tracking, normalization
pub mod intake;
pub mod pubsub;

// Downstream collaborators
pub mod pipeline;
pub mod profile;
pub mod report;

// HTTP surface
pub mod server;

// Re-export key types
pub use config::{Environment, ServiceConfig};
pub use error::{ConfigError, EmailError, EnvelopeError, PipelineError, ProfileError, SchemaError};

pub use intake::{ClientRecord, FormSchema, FormShape, Normalized, Normalizer, RawClientData, SchemaDrift};
pub use pubsub::{Admission, DecodedMessage, PushEnvelope, RetryTracker, TrackerConfig};

pub use pipeline::{BackgroundDispatcher, Dispatcher, IntakeJob, Pipeline};
pub use profile::{ClientProfile, GeminiProfileGenerator, ProfileGenerator};
pub use report::{render_report, ProfileReport, ReportSender, SmtpReportSender};

pub use server::{create_router, start_server, AppState, Outcome};
