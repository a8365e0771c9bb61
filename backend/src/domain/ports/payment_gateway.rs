//! Driven port wrapping a third-party payment provider.
//!
//! Each adapter creates provider-side orders, captures them and re-validates
//! their status. Validation results carry the course and user the order was
//! created for so services never trust client-supplied identifiers on the
//! return leg.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::{CourseId, Currency, PaymentProvider, PhoneNumber, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment provider adapters.
    pub enum PaymentGatewayError {
        /// The provider could not be reached or timed out.
        Transport { message: String } => "payment provider transport failed: {message}",
        /// The provider answered with a non-success status.
        Upstream { status: u16, message: String } =>
            "payment provider rejected the request ({status}): {message}",
        /// The provider answered with a body the adapter cannot read.
        Decode { message: String } => "payment provider response was malformed: {message}",
        /// Credentials or provider responses required for this request are missing.
        Configuration { message: String } => "payment provider misconfigured: {message}",
        /// The request cannot be sent to this provider.
        InvalidRequest { message: String } => "payment request invalid: {message}",
    }
}

/// Order creation input.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub title: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub success_url: String,
    pub cancel_url: String,
    /// Provider customer reference, when the provider issues one.
    pub customer_ref: Option<String>,
    /// Payer phone number, required by mobile money providers.
    pub phone: Option<PhoneNumber>,
}

/// Provider-side order created for a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub order_id: String,
    /// Where the payer approves the payment; mobile money pushes to the
    /// handset instead and has no URL.
    pub approval_url: Option<String>,
    pub raw: Value,
}

/// Provider view of an order on the return leg.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderValidation {
    /// Whether the payment is approved or already settled.
    pub is_valid: bool,
    /// Whether the provider has already settled the funds.
    pub is_completed: bool,
    /// Raw provider status string, for logs and audit.
    pub status: String,
    pub course_id: Option<CourseId>,
    pub user_id: Option<UserId>,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub raw: Value,
}

/// Result of capturing an approved order.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    /// Provider identifier of the settled payment.
    pub reference: String,
    pub completed: bool,
    pub status: String,
    pub raw: Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider served by this adapter.
    fn provider(&self) -> PaymentProvider;

    /// Return the provider's customer reference for `user`, creating one
    /// when the provider keeps customer records.
    async fn ensure_customer(&self, user: &User) -> Result<Option<String>, PaymentGatewayError> {
        Ok(user.billing_customer_id().map(str::to_owned))
    }

    /// Create an order for the payer to approve.
    async fn create_order(&self, request: &OrderRequest)
    -> Result<CreatedOrder, PaymentGatewayError>;

    /// Capture an approved order.
    async fn capture(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError>;

    /// Fetch the provider's current view of an order.
    async fn validate(&self, order_id: &str) -> Result<OrderValidation, PaymentGatewayError>;
}

/// Gateway used when a provider has no credentials configured.
///
/// Every call fails with [`PaymentGatewayError::Configuration`], which the
/// checkout service reports as a generic payment failure.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredGateway {
    provider: PaymentProvider,
}

impl UnconfiguredGateway {
    #[must_use]
    pub const fn new(provider: PaymentProvider) -> Self {
        Self { provider }
    }

    fn error(self) -> PaymentGatewayError {
        PaymentGatewayError::configuration(format!("{} credentials are not set", self.provider))
    }
}

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    fn provider(&self) -> PaymentProvider {
        self.provider
    }

    async fn create_order(
        &self,
        _request: &OrderRequest,
    ) -> Result<CreatedOrder, PaymentGatewayError> {
        Err(self.error())
    }

    async fn capture(&self, _order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        Err(self.error())
    }

    async fn validate(&self, _order_id: &str) -> Result<OrderValidation, PaymentGatewayError> {
        Err(self.error())
    }
}

/// One gateway per supported provider.
#[derive(Clone)]
pub struct PaymentGateways {
    paypal: Arc<dyn PaymentGateway>,
    mpesa: Arc<dyn PaymentGateway>,
    stripe: Arc<dyn PaymentGateway>,
}

impl PaymentGateways {
    pub fn new(
        paypal: Arc<dyn PaymentGateway>,
        mpesa: Arc<dyn PaymentGateway>,
        stripe: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            paypal,
            mpesa,
            stripe,
        }
    }

    /// Gateways that refuse every request.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::new(
            Arc::new(UnconfiguredGateway::new(PaymentProvider::PayPal)),
            Arc::new(UnconfiguredGateway::new(PaymentProvider::Mpesa)),
            Arc::new(UnconfiguredGateway::new(PaymentProvider::Stripe)),
        )
    }

    /// Gateway for `provider`.
    #[must_use]
    pub fn get(&self, provider: PaymentProvider) -> &dyn PaymentGateway {
        match provider {
            PaymentProvider::PayPal => self.paypal.as_ref(),
            PaymentProvider::Mpesa => self.mpesa.as_ref(),
            PaymentProvider::Stripe => self.stripe.as_ref(),
        }
    }
}
