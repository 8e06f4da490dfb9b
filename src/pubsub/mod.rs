/// Pub/Sub push integration module
///
/// Provides the push envelope decoder and the bounded retry tracker that caps
/// how often a redelivered message reaches downstream processing.

pub mod envelope;
pub mod retry_tracker;

pub use envelope::{decode, DecodedMessage, PushEnvelope, PushMessage};
pub use retry_tracker::{Admission, RetryTracker, TrackerConfig};
