//! SMTP delivery of designer reports.

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::EmailError;
use crate::report::render::ProfileReport;
use crate::report::{DeliveryReceipt, ReportSender};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS
    pub use_tls: bool,
    pub sender_email: Option<String>,
    pub sender_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            use_tls: true,
            sender_email: None,
            sender_name: "Interior AI Service".to_string(),
        }
    }
}

/// Sends reports as multipart (plain text + HTML) mail.
pub struct SmtpReportSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    server: String,
}

impl SmtpReportSender {
    /// Build the transport. Must run inside a Tokio runtime.
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let sender = config.sender_email.as_deref().ok_or(EmailError::MissingSender)?;
        let from = Mailbox::new(Some(config.sender_name.clone()), parse_address(sender)?);

        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        };
        builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::info!(
            "SMTP sender configured for {}:{} as {}",
            config.server,
            config.port,
            sender
        );

        Ok(Self {
            transport: builder.build(),
            from,
            server: config.server.clone(),
        })
    }

    /// Assemble the MIME message for a report.
    pub fn build_message(&self, report: &ProfileReport) -> Result<Message, EmailError> {
        let to = Mailbox::new(None, parse_address(&report.recipient)?);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(report.subject.as_str())
            .message_id(Some(format!("<{}@{}>", report.report_id, self.server)))
            .multipart(MultiPart::alternative_plain_html(
                report.text.clone(),
                report.html.clone(),
            ))?;

        Ok(message)
    }
}

#[async_trait]
impl ReportSender for SmtpReportSender {
    async fn send(&self, report: &ProfileReport) -> Result<DeliveryReceipt, EmailError> {
        let message = self.build_message(report)?;
        let response = self.transport.send(message).await?;

        let server_response = response.message().collect::<Vec<_>>().join(" ");
        if !response.is_positive() {
            return Err(EmailError::Rejected(format!("{} {}", response.code(), server_response)));
        }

        tracing::info!(
            "Report {} sent to {} ({})",
            report.report_id,
            report.recipient,
            report.subject
        );

        Ok(DeliveryReceipt {
            report_id: report.report_id,
            recipient: report.recipient.clone(),
            sent_at: Utc::now(),
            server_response,
        })
    }
}

fn parse_address(address: &str) -> Result<Address, EmailError> {
    address.trim().parse().map_err(|source| EmailError::Address {
        address: address.to_string(),
        source,
    })
}
