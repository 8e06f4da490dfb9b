//! Designer report rendering and delivery.

pub mod render;
pub mod smtp;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::EmailError;

pub use render::{escape_html, render_report, ProfileReport};
pub use smtp::{SmtpConfig, SmtpReportSender};

/// Confirmation that a report left this service.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub report_id: Uuid,
    pub recipient: String,
    pub sent_at: DateTime<Utc>,
    pub server_response: String,
}

/// Delivers a rendered report to its recipient.
#[async_trait]
pub trait ReportSender: Send + Sync {
    async fn send(&self, report: &ProfileReport) -> Result<DeliveryReceipt, EmailError>;
}

/// Sender used while SMTP is not configured. Every send fails, so reports are
/// logged and dropped and `/health/readiness` reports `email_config` unhealthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredSender;

#[async_trait]
impl ReportSender for UnconfiguredSender {
    async fn send(&self, _report: &ProfileReport) -> Result<DeliveryReceipt, EmailError> {
        Err(EmailError::MissingSender)
    }
}
