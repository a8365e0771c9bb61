//! Port for transactional email delivery.

use async_trait::async_trait;
use tracing::info;

use crate::domain::EmailMessage;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail delivery adapters.
    pub enum MailerError {
        /// The mail API could not be reached.
        Transport { message: String } => "mail transport failed: {message}",
        /// The mail API refused the message.
        Rejected { status: u16, message: String } => "mail API rejected message ({status}): {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}

/// Mailer used when no mail API is configured; messages are logged and
/// dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyMailer;

#[async_trait]
impl Mailer for LogOnlyMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        info!(to = %message.to, subject = %message.subject, "mail API not configured; dropping message");
        Ok(())
    }
}
