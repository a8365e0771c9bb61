//! JSON mail API adapter.
//!
//! Posts `{from, to, subject, html}` with a bearer key, the request shape
//! shared by Resend-style transactional mail services.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::EmailMessage;
use crate::domain::ports::{Mailer, MailerError};

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Endpoint, key and sender address for the mail API.
#[derive(Clone)]
pub struct HttpMailerConfig {
    pub endpoint: Url,
    pub api_key: Zeroizing<String>,
    pub from: String,
}

/// Reqwest-backed mailer.
pub struct HttpMailer {
    client: Client,
    config: HttpMailerConfig,
}

impl HttpMailer {
    pub fn new(client: Client, config: HttpMailerConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

fn send_body<'a>(from: &'a str, message: &'a EmailMessage) -> SendBody<'a> {
    SendBody {
        from,
        to: [message.to.as_str()],
        subject: &message.subject,
        html: &message.html,
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(self.config.api_key.as_str())
            .json(&send_body(&self.config.from, message))
            .send()
            .await
            .map_err(|err| MailerError::transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, "mail accepted");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.chars().take(PREVIEW_CHAR_LIMIT).collect();
        Err(MailerError::rejected(status.as_u16(), preview))
    }
}
