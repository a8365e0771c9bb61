//! Shared reqwest plumbing for payment provider adapters.
//!
//! Adapters own request shapes; this module owns endpoint joining, response
//! decoding, HTTP status mapping and access-token caching.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::ports::PaymentGatewayError;

/// Tokens are refreshed this long before the provider says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const PREVIEW_CHAR_LIMIT: usize = 160;

/// Resolve `path` against a provider base URL.
pub(super) fn endpoint(base: &Url, path: &str) -> Result<Url, PaymentGatewayError> {
    base.join(path.trim_start_matches('/')).map_err(|err| {
        PaymentGatewayError::configuration(format!("invalid provider endpoint {path}: {err}"))
    })
}

/// Decode a provider response into a typed DTO and its raw JSON.
///
/// Non-success statuses become [`PaymentGatewayError::Upstream`] carrying a
/// short body preview.
pub(super) async fn read_json<T>(response: Response) -> Result<(T, Value), PaymentGatewayError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    decode_body(body.as_ref())
}

pub(super) fn decode_body<T>(body: &[u8]) -> Result<(T, Value), PaymentGatewayError>
where
    T: DeserializeOwned,
{
    let raw: Value = serde_json::from_slice(body)
        .map_err(|err| PaymentGatewayError::decode(format!("invalid JSON payload: {err}")))?;
    let typed = T::deserialize(&raw)
        .map_err(|err| PaymentGatewayError::decode(format!("unexpected payload shape: {err}")))?;
    Ok((typed, raw))
}

pub(super) fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    if error.is_timeout() {
        PaymentGatewayError::transport(format!("request timed out: {error}"))
    } else {
        PaymentGatewayError::transport(error.to_string())
    }
}

pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        preview
    };
    PaymentGatewayError::upstream(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

struct CachedToken {
    value: String,
    refresh_after: Instant,
}

/// OAuth access token shared by concurrent requests to one provider.
#[derive(Default)]
pub(super) struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Return the cached token or fetch a new one.
    ///
    /// `fetch` yields the token and its lifetime. The lock is held while
    /// fetching so a burst of requests performs one token exchange.
    pub(super) async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<String, PaymentGatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, Duration), PaymentGatewayError>>,
    {
        let mut guard = self.inner.lock().await;
        if let Some(cached) = guard.as_ref().filter(|c| Instant::now() < c.refresh_after) {
            return Ok(cached.value.clone());
        }
        let (value, lifetime) = fetch().await?;
        *guard = Some(CachedToken {
            value: value.clone(),
            refresh_after: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        });
        Ok(value)
    }
}
