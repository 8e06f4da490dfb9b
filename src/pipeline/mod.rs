//! Background processing of accepted intake submissions.
//!
//! The webhook hands each accepted record to a `Dispatcher` and returns
//! immediately. The production dispatcher spawns one Tokio task per job that
//! generates the design profile, renders the report and emails it. Results
//! never flow back to the webhook; failures are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info_span, Instrument};

use crate::error::PipelineError;
use crate::intake::ClientRecord;
use crate::profile::ProfileGenerator;
use crate::report::{render_report, DeliveryReceipt, ReportSender};

/// One accepted submission awaiting downstream processing.
#[derive(Debug, Clone)]
pub struct IntakeJob {
    pub message_id: String,
    /// Delivery attempt that produced this job (1 = first delivery)
    pub attempt: u32,
    pub record: ClientRecord,
    pub received_at: DateTime<Utc>,
}

/// Hands jobs off for processing without waiting for them.
///
/// Implementations must return promptly; the webhook calls this on the
/// request path.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: IntakeJob);
}

/// Generate, render and send for one job.
pub struct Pipeline {
    generator: Arc<dyn ProfileGenerator>,
    sender: Arc<dyn ReportSender>,
    recipient: String,
    email_max_attempts: u32,
    retry_delay: Duration,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn ProfileGenerator>,
        sender: Arc<dyn ReportSender>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            sender,
            recipient: recipient.into(),
            email_max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Retry policy for report delivery. At least one attempt is always made.
    pub fn with_email_retry(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.email_max_attempts = max_attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub async fn run(&self, job: &IntakeJob) -> Result<DeliveryReceipt, PipelineError> {
        let profile = self.generator.generate(&job.record).await?;
        tracing::info!(
            "Profile for {} generated with {} recommendation(s)",
            profile.client_name,
            profile.recommendations.len()
        );

        let report = render_report(&profile, &self.recipient);

        let mut attempt = 1;
        loop {
            match self.sender.send(&report).await {
                Ok(receipt) => return Ok(receipt),
                Err(source) if attempt >= self.email_max_attempts => {
                    return Err(PipelineError::Email { attempts: attempt, source });
                }
                Err(e) => {
                    tracing::warn!(
                        "Report delivery attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.email_max_attempts,
                        e,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Dispatcher that runs each job on its own Tokio task.
#[derive(Clone)]
pub struct BackgroundDispatcher {
    pipeline: Arc<Pipeline>,
}

impl BackgroundDispatcher {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl Dispatcher for BackgroundDispatcher {
    fn dispatch(&self, job: IntakeJob) {
        let pipeline = Arc::clone(&self.pipeline);
        let span = info_span!("intake_job", message_id = %job.message_id, attempt = job.attempt);

        tokio::spawn(
            async move {
                let started = std::time::Instant::now();
                match pipeline.run(&job).await {
                    Ok(receipt) => tracing::info!(
                        "Intake job for {} finished in {} ms; report {} sent to {}",
                        job.record.display_name(),
                        started.elapsed().as_millis(),
                        receipt.report_id,
                        receipt.recipient
                    ),
                    Err(e) => tracing::error!(
                        "Intake job for {} failed: {}",
                        job.record.display_name(),
                        e
                    ),
                }
            }
            .instrument(span),
        );
    }
}
