//! AI design profile generation.
//!
//! The pipeline only depends on the `ProfileGenerator` trait; the Gemini
//! client is the production implementation.

pub mod gemini;
pub mod model;

use async_trait::async_trait;

use crate::error::ProfileError;
use crate::intake::ClientRecord;

pub use gemini::{GeminiProfileGenerator, GenAiConfig};
pub use model::{ClientProfile, DesignRecommendation, Priority};

/// Synthesizes a design profile from a canonical client record.
#[async_trait]
pub trait ProfileGenerator: Send + Sync {
    async fn generate(&self, record: &ClientRecord) -> Result<ClientProfile, ProfileError>;
}
