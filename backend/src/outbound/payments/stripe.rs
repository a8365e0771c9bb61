//! Stripe Checkout Sessions adapter.
//!
//! Stripe's API is form-encoded. Sessions carry `metadata[course_id]` and
//! `metadata[user_id]`; a session is settled once `payment_status` is
//! `paid`, so capture re-reads the session instead of calling a separate
//! capture endpoint.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::http_support::{endpoint, map_transport_error, read_json};
use crate::domain::ports::{
    CaptureResult, CreatedOrder, OrderRequest, OrderValidation, PaymentGateway,
    PaymentGatewayError,
};
use crate::domain::{
    CourseId, Currency, PaymentProvider, User, UserId, from_storage_units, to_storage_units,
};

/// Public API host.
pub const STRIPE_API_URL: &str = "https://api.stripe.com/";

/// Credentials and endpoint for the Stripe API.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: Zeroizing<String>,
    pub base_url: Url,
}

/// Reqwest-backed Stripe gateway.
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(client: Client, config: StripeConfig) -> Self {
        Self { client, config }
    }

    fn session_url(&self, session_id: &str) -> Result<Url, PaymentGatewayError> {
        let session_id = session_id.trim();
        if !session_id.starts_with("cs_") || session_id.contains('/') {
            return Err(PaymentGatewayError::invalid_request(
                "malformed Stripe checkout session id",
            ));
        }
        endpoint(
            &self.config.base_url,
            &format!("v1/checkout/sessions/{session_id}"),
        )
    }

    async fn fetch_session(&self, session_id: &str) -> Result<(SessionDto, Value), PaymentGatewayError> {
        let url = self.session_url(session_id)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.secret_key.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;
        read_json(response).await
    }
}

#[derive(Debug, Deserialize)]
struct SessionDto {
    id: String,
    url: Option<String>,
    #[serde(default)]
    payment_status: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
    amount_total: Option<i64>,
    currency: Option<String>,
    payment_intent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDto {
    id: String,
}

/// Form fields for a one-item payment session.
fn session_form(request: &OrderRequest) -> Result<Vec<(&'static str, String)>, PaymentGatewayError> {
    let unit_amount = to_storage_units(request.amount)
        .map_err(|err| PaymentGatewayError::invalid_request(err.to_string()))?;
    let mut form = vec![
        ("mode", "payment".to_owned()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("client_reference_id", request.user_id.to_string()),
        ("line_items[0][quantity]", "1".to_owned()),
        (
            "line_items[0][price_data][currency]",
            request.currency.as_str().to_ascii_lowercase(),
        ),
        ("line_items[0][price_data][unit_amount]", unit_amount.to_string()),
        (
            "line_items[0][price_data][product_data][name]",
            request.title.clone(),
        ),
        ("metadata[course_id]", request.course_id.to_string()),
        ("metadata[user_id]", request.user_id.to_string()),
    ];
    if let Some(customer) = request.customer_ref.as_ref() {
        form.push(("customer", customer.clone()));
    }
    Ok(form)
}

fn validation_from(session: SessionDto, raw: Value) -> OrderValidation {
    let paid = session.payment_status == "paid";
    OrderValidation {
        is_valid: paid,
        is_completed: paid,
        status: session.payment_status,
        course_id: session
            .metadata
            .get("course_id")
            .and_then(|id| CourseId::parse(id).ok()),
        user_id: session
            .metadata
            .get("user_id")
            .and_then(|id| UserId::parse(id).ok()),
        amount: session.amount_total.map(from_storage_units),
        currency: session
            .currency
            .as_deref()
            .and_then(|code| Currency::new(code).ok()),
        raw,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Stripe
    }

    async fn ensure_customer(&self, user: &User) -> Result<Option<String>, PaymentGatewayError> {
        if let Some(existing) = user.billing_customer_id() {
            return Ok(Some(existing.to_owned()));
        }
        let url = endpoint(&self.config.base_url, "v1/customers")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.config.secret_key.as_str())
            .form(&[
                ("email", user.email().as_ref()),
                ("name", user.display_name().as_ref()),
                ("metadata[user_id]", user.id().to_string().as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;
        let (customer, _): (CustomerDto, Value) = read_json(response).await?;
        info!(user_id = %user.id(), customer_id = %customer.id, "stripe customer created");
        Ok(Some(customer.id))
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CreatedOrder, PaymentGatewayError> {
        let form = session_form(request)?;
        let url = endpoint(&self.config.base_url, "v1/checkout/sessions")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.config.secret_key.as_str())
            .form(&form)
            .send()
            .await
            .map_err(map_transport_error)?;
        let (session, raw): (SessionDto, Value) = read_json(response).await?;
        let approval_url = session.url.clone().ok_or_else(|| {
            PaymentGatewayError::configuration(format!(
                "Stripe session {} has no checkout url",
                session.id
            ))
        })?;
        debug!(order_id = %session.id, "stripe checkout session created");
        Ok(CreatedOrder {
            order_id: session.id,
            approval_url: Some(approval_url),
            raw,
        })
    }

    async fn capture(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        let (session, raw) = self.fetch_session(order_id).await?;
        let completed = session.payment_status == "paid";
        Ok(CaptureResult {
            reference: session.payment_intent.unwrap_or(session.id),
            completed,
            status: session.payment_status,
            raw,
        })
    }

    async fn validate(&self, order_id: &str) -> Result<OrderValidation, PaymentGatewayError> {
        let (session, raw) = self.fetch_session(order_id).await?;
        Ok(validation_from(session, raw))
    }
}
