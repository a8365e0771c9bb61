//! Driving port for the checkout and payment capture workflow.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::{
    CourseId, EnrollmentOutcome, Error, PaymentProvider, PaymentStatus, PhoneNumber, UserId,
};

/// Request to open a provider checkout for one course.
#[derive(Debug, Clone, PartialEq)]
pub struct StartCheckout {
    pub provider: PaymentProvider,
    pub course_id: CourseId,
    /// Client-side price; must equal the stored price when present.
    pub price: Option<Decimal>,
    pub phone: Option<PhoneNumber>,
}

/// Provider order opened for the payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutStarted {
    pub provider: PaymentProvider,
    pub order_id: String,
    pub approval_url: Option<String>,
}

/// Return-leg confirmation from the payer's browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteCheckout {
    pub provider: PaymentProvider,
    /// Provider order or session id.
    pub reference: String,
    /// Course the client believes it bought; checked against the provider.
    pub course_id: Option<CourseId>,
}

/// Result of a completed checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutCompleted {
    pub course_id: CourseId,
    pub outcome: EnrollmentOutcome,
}

/// Asynchronous STK push result posted by M-PESA.
#[derive(Debug, Clone, PartialEq)]
pub struct MpesaCallback {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub result_code: i64,
    pub result_desc: String,
    pub metadata: Value,
}

/// M-PESA result code sent when the payer cancels the prompt.
pub const MPESA_CANCELLED_RESULT_CODE: i64 = 1032;

/// Payment state for client polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusView {
    pub provider: PaymentProvider,
    pub reference: String,
    pub course_id: CourseId,
    pub status: PaymentStatus,
    pub enrolled: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutCommand: Send + Sync {
    /// Create a provider order for a published course the user does not own.
    async fn start_checkout(
        &self,
        user_id: &UserId,
        request: StartCheckout,
    ) -> Result<CheckoutStarted, Error>;

    /// Verify, capture and enroll after the payer returns.
    async fn complete_checkout(
        &self,
        user_id: &UserId,
        request: CompleteCheckout,
    ) -> Result<CheckoutCompleted, Error>;

    /// Apply an M-PESA STK callback.
    async fn handle_mpesa_callback(&self, callback: MpesaCallback) -> Result<(), Error>;

    /// Current state of a payment the caller started.
    async fn payment_status(
        &self,
        user_id: &UserId,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<PaymentStatusView, Error>;
}
