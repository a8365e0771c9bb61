//! Safaricom Daraja STK push adapter for M-PESA.
//!
//! An STK push prompts the payer's handset; the result arrives later on the
//! callback endpoint. There is no capture step: `capture` and `validate` both
//! query the push status.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, Utc};
use mockable::Clock;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use super::http_support::{TokenCache, endpoint, map_transport_error, read_json};
use crate::domain::ports::{
    CaptureResult, CreatedOrder, OrderRequest, OrderValidation, PaymentGateway,
    PaymentGatewayError,
};
use crate::domain::{PaymentProvider, whole_units_at_least_one};

/// Daraja sandbox host.
pub const MPESA_SANDBOX_URL: &str = "https://sandbox.safaricom.co.ke/";

/// Daraja timestamps are East Africa Time.
const EAT_OFFSET_SECONDS: i32 = 3 * 3600;
/// Daraja truncates account references beyond this length.
const ACCOUNT_REFERENCE_MAX: usize = 12;

/// Credentials and endpoint for Daraja.
#[derive(Clone)]
pub struct MpesaConfig {
    pub consumer_key: String,
    pub consumer_secret: Zeroizing<String>,
    pub shortcode: String,
    pub passkey: Zeroizing<String>,
    pub base_url: Url,
}

/// Reqwest-backed M-PESA gateway.
pub struct MpesaGateway {
    client: Client,
    config: MpesaConfig,
    clock: Arc<dyn Clock>,
    token: TokenCache,
}

impl MpesaGateway {
    pub fn new(client: Client, config: MpesaConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            config,
            clock,
            token: TokenCache::default(),
        }
    }

    async fn access_token(&self) -> Result<String, PaymentGatewayError> {
        self.token
            .get_or_fetch(|| async {
                let url = endpoint(
                    &self.config.base_url,
                    "oauth/v1/generate?grant_type=client_credentials",
                )?;
                let response = self
                    .client
                    .get(url)
                    .basic_auth(
                        &self.config.consumer_key,
                        Some(self.config.consumer_secret.as_str()),
                    )
                    .send()
                    .await
                    .map_err(map_transport_error)?;
                let (token, _): (TokenDto, Value) = read_json(response).await?;
                let lifetime = token.expires_in.parse::<u64>().unwrap_or(3599);
                Ok((token.access_token, Duration::from_secs(lifetime)))
            })
            .await
    }

    fn credentials(&self) -> (String, String) {
        let timestamp = daraja_timestamp(self.clock.utc());
        let password = stk_password(&self.config.shortcode, &self.config.passkey, &timestamp);
        (password, timestamp)
    }

    async fn query(&self, checkout_request_id: &str) -> Result<(QueryDto, Value), PaymentGatewayError> {
        let (password, timestamp) = self.credentials();
        let token = self.access_token().await?;
        let url = endpoint(&self.config.base_url, "mpesa/stkpushquery/v1/query")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&QueryBody {
                business_short_code: &self.config.shortcode,
                password: &password,
                timestamp: &timestamp,
                checkout_request_id,
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        read_json(response).await
    }
}

/// Format `now` as Daraja's `YYYYMMDDHHmmss` in East Africa Time.
pub(crate) fn daraja_timestamp(now: DateTime<Utc>) -> String {
    const FORMAT: &str = "%Y%m%d%H%M%S";
    match FixedOffset::east_opt(EAT_OFFSET_SECONDS) {
        Some(offset) => now.with_timezone(&offset).format(FORMAT).to_string(),
        None => now.format(FORMAT).to_string(),
    }
}

/// STK password: base64 of shortcode, passkey and timestamp concatenated.
pub(crate) fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}

fn account_reference(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(ACCOUNT_REFERENCE_MAX)
        .collect();
    if cleaned.is_empty() {
        "CourseHub".to_owned()
    } else {
        cleaned
    }
}

#[derive(Debug, Deserialize)]
struct TokenDto {
    access_token: String,
    #[serde(default)]
    expires_in: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushBody<'a> {
    business_short_code: &'a str,
    password: &'a str,
    timestamp: &'a str,
    transaction_type: &'static str,
    amount: i64,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    callback_url: &'a str,
    account_reference: String,
    transaction_desc: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushDto {
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: Option<String>,
    #[serde(default)]
    response_code: String,
    #[serde(default)]
    response_description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryBody<'a> {
    business_short_code: &'a str,
    password: &'a str,
    timestamp: &'a str,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryDto {
    /// Daraja returns this as a string on the query endpoint.
    result_code: Option<Value>,
    #[serde(default)]
    result_desc: String,
}

impl QueryDto {
    fn result_code(&self) -> Option<i64> {
        match self.result_code.as_ref()? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

fn validation_from(query: QueryDto, raw: Value) -> OrderValidation {
    let code = query.result_code();
    let success = code == Some(0);
    OrderValidation {
        is_valid: success,
        is_completed: success,
        status: match code {
            Some(code) => format!("{code}: {}", query.result_desc),
            None => "pending".to_owned(),
        },
        course_id: None,
        user_id: None,
        amount: None,
        currency: None,
        raw,
    }
}

#[async_trait]
impl PaymentGateway for MpesaGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Mpesa
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CreatedOrder, PaymentGatewayError> {
        let phone = request.phone.as_ref().ok_or_else(|| {
            PaymentGatewayError::invalid_request("phone number is required for M-PESA")
        })?;
        if !request.currency.is_kes() {
            return Err(PaymentGatewayError::invalid_request(
                "M-PESA payments must be priced in KES",
            ));
        }
        let amount = whole_units_at_least_one(request.amount)
            .map_err(|err| PaymentGatewayError::invalid_request(err.to_string()))?;
        let (password, timestamp) = self.credentials();
        let token = self.access_token().await?;
        let url = endpoint(&self.config.base_url, "mpesa/stkpush/v1/processrequest")?;
        let body = StkPushBody {
            business_short_code: &self.config.shortcode,
            password: &password,
            timestamp: &timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount,
            party_a: phone.as_str(),
            party_b: &self.config.shortcode,
            phone_number: phone.as_str(),
            callback_url: &request.success_url,
            account_reference: account_reference(&request.title),
            transaction_desc: format!("Payment for {}", request.title),
        };
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let (push, raw): (StkPushDto, Value) = read_json(response).await?;
        if push.response_code != "0" {
            return Err(PaymentGatewayError::upstream(
                200_u16,
                format!("STK push refused: {}", push.response_description),
            ));
        }
        let order_id = push.checkout_request_id.ok_or_else(|| {
            PaymentGatewayError::decode("STK push response has no CheckoutRequestID")
        })?;
        debug!(order_id = %order_id, "mpesa stk push sent");
        Ok(CreatedOrder {
            order_id,
            approval_url: None,
            raw,
        })
    }

    async fn capture(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        let validation = self.validate(order_id).await?;
        Ok(CaptureResult {
            reference: order_id.to_owned(),
            completed: validation.is_completed,
            status: validation.status,
            raw: validation.raw,
        })
    }

    async fn validate(&self, order_id: &str) -> Result<OrderValidation, PaymentGatewayError> {
        let (query, raw) = self.query(order_id.trim()).await?;
        Ok(validation_from(query, raw))
    }
}
