//! PayPal Orders v2 adapter.
//!
//! Orders carry the course id as the purchase unit `reference_id` and the
//! payer's user id as `custom_id`, so the return leg can recover both from
//! PayPal instead of trusting query parameters.

use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

use super::http_support::{TokenCache, endpoint, map_transport_error, read_json};
use crate::domain::ports::{
    CaptureResult, CreatedOrder, OrderRequest, OrderValidation, PaymentGateway,
    PaymentGatewayError,
};
use crate::domain::{CourseId, Currency, PaymentProvider, UserId};

/// Sandbox API host used when no base URL is configured.
pub const PAYPAL_SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com/";

/// Credentials and endpoint for the PayPal REST API.
#[derive(Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: Zeroizing<String>,
    pub base_url: Url,
}

/// Reqwest-backed PayPal gateway.
pub struct PayPalGateway {
    client: Client,
    config: PayPalConfig,
    token: TokenCache,
}

impl PayPalGateway {
    /// Build the adapter around a shared HTTP client.
    pub fn new(client: Client, config: PayPalConfig) -> Self {
        Self {
            client,
            config,
            token: TokenCache::default(),
        }
    }

    async fn access_token(&self) -> Result<String, PaymentGatewayError> {
        self.token
            .get_or_fetch(|| async {
                let url = endpoint(&self.config.base_url, "v1/oauth2/token")?;
                let response = self
                    .client
                    .post(url)
                    .basic_auth(&self.config.client_id, Some(self.config.client_secret.as_str()))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await
                    .map_err(map_transport_error)?;
                let (token, _): (TokenDto, Value) = read_json(response).await?;
                Ok((token.access_token, Duration::from_secs(token.expires_in)))
            })
            .await
    }

    fn order_url(&self, order_id: &str, suffix: &str) -> Result<Url, PaymentGatewayError> {
        let order_id = order_id.trim();
        if order_id.is_empty() || order_id.contains('/') {
            return Err(PaymentGatewayError::invalid_request("malformed PayPal order id"));
        }
        endpoint(
            &self.config.base_url,
            &format!("v2/checkout/orders/{order_id}{suffix}"),
        )
    }
}

#[derive(Debug, Deserialize)]
struct TokenDto {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    300
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    intent: &'static str,
    purchase_units: [PurchaseUnitBody<'a>; 1],
    application_context: ApplicationContext<'a>,
}

#[derive(Debug, Serialize)]
struct PurchaseUnitBody<'a> {
    reference_id: String,
    custom_id: String,
    description: &'a str,
    amount: AmountDto,
}

#[derive(Debug, Serialize)]
struct ApplicationContext<'a> {
    return_url: &'a str,
    cancel_url: &'a str,
    user_action: &'static str,
    shipping_preference: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AmountDto {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct OrderDto {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    links: Vec<LinkDto>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnitDto>,
}

#[derive(Debug, Deserialize)]
struct LinkDto {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnitDto {
    reference_id: Option<String>,
    custom_id: Option<String>,
    amount: Option<AmountDto>,
    payments: Option<PaymentsDto>,
}

#[derive(Debug, Deserialize)]
struct PaymentsDto {
    #[serde(default)]
    captures: Vec<CaptureDto>,
}

#[derive(Debug, Deserialize)]
struct CaptureDto {
    id: String,
    status: String,
}

/// PayPal expects a plain decimal string with two places.
fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

fn create_body(request: &OrderRequest) -> CreateOrderBody<'_> {
    CreateOrderBody {
        intent: "CAPTURE",
        purchase_units: [PurchaseUnitBody {
            reference_id: request.course_id.to_string(),
            custom_id: request.user_id.to_string(),
            description: request.title.as_str(),
            amount: AmountDto {
                currency_code: request.currency.as_str().to_owned(),
                value: format_amount(request.amount),
            },
        }],
        application_context: ApplicationContext {
            return_url: request.success_url.as_str(),
            cancel_url: request.cancel_url.as_str(),
            user_action: "PAY_NOW",
            shipping_preference: "NO_SHIPPING",
        },
    }
}

fn approval_link(order: &OrderDto) -> Result<String, PaymentGatewayError> {
    order
        .links
        .iter()
        .find(|link| link.rel == "approve" || link.rel == "payer-action")
        .map(|link| link.href.clone())
        .ok_or_else(|| {
            PaymentGatewayError::configuration(format!(
                "PayPal order {} has no approval link",
                order.id
            ))
        })
}

fn validation_from(order: OrderDto, raw: Value) -> OrderValidation {
    let unit = order.purchase_units.into_iter().next();
    let (course_id, user_id, amount) = match unit {
        Some(unit) => (
            unit.reference_id.and_then(|id| CourseId::parse(&id).ok()),
            unit.custom_id.and_then(|id| UserId::parse(&id).ok()),
            unit.amount,
        ),
        None => (None, None, None),
    };
    OrderValidation {
        is_valid: matches!(order.status.as_str(), "APPROVED" | "COMPLETED"),
        is_completed: order.status == "COMPLETED",
        status: order.status,
        course_id,
        user_id,
        amount: amount
            .as_ref()
            .and_then(|amount| amount.value.parse::<Decimal>().ok()),
        currency: amount.and_then(|amount| Currency::new(&amount.currency_code).ok()),
        raw,
    }
}

fn capture_from(order: OrderDto, raw: Value) -> CaptureResult {
    let capture = order
        .purchase_units
        .into_iter()
        .filter_map(|unit| unit.payments)
        .flat_map(|payments| payments.captures)
        .next();
    let (reference, capture_status) = match capture {
        Some(capture) => (capture.id, Some(capture.status)),
        None => (order.id, None),
    };
    let completed =
        order.status == "COMPLETED" && capture_status.as_deref().is_none_or(|s| s == "COMPLETED");
    CaptureResult {
        reference,
        completed,
        status: capture_status.unwrap_or(order.status),
        raw,
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::PayPal
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CreatedOrder, PaymentGatewayError> {
        let token = self.access_token().await?;
        let url = endpoint(&self.config.base_url, "v2/checkout/orders")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&create_body(request))
            .send()
            .await
            .map_err(map_transport_error)?;
        let (order, raw): (OrderDto, Value) = read_json(response).await?;
        let approval_url = approval_link(&order)?;
        debug!(order_id = %order.id, status = %order.status, "paypal order created");
        Ok(CreatedOrder {
            order_id: order.id,
            approval_url: Some(approval_url),
            raw,
        })
    }

    async fn capture(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        let url = self.order_url(order_id, "/capture")?;
        let token = self.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await
            .map_err(map_transport_error)?;
        let (order, raw): (OrderDto, Value) = read_json(response).await?;
        Ok(capture_from(order, raw))
    }

    async fn validate(&self, order_id: &str) -> Result<OrderValidation, PaymentGatewayError> {
        let url = self.order_url(order_id, "")?;
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_transport_error)?;
        let (order, raw): (OrderDto, Value) = read_json(response).await?;
        Ok(validation_from(order, raw))
    }
}
