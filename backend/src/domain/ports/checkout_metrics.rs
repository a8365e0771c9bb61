//! Domain port surface for recording checkout outcome metrics.
//!
//! Implementations may export to Prometheus or simply discard metrics in
//! tests.

use async_trait::async_trait;

use crate::domain::PaymentProvider;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording checkout metrics.
    pub enum CheckoutMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "checkout metrics exporter failed: {message}",
    }
}

/// Outcome label attached to each checkout metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    OrderCreated,
    Enrolled,
    AlreadyEnrolled,
    Failed,
    Cancelled,
}

impl CheckoutOutcome {
    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::Enrolled => "enrolled",
            Self::AlreadyEnrolled => "already_enrolled",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutMetrics: Send + Sync {
    /// Count one checkout outcome for a provider.
    async fn record(
        &self,
        provider: PaymentProvider,
        outcome: CheckoutOutcome,
    ) -> Result<(), CheckoutMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpCheckoutMetrics;

#[async_trait]
impl CheckoutMetrics for NoOpCheckoutMetrics {
    async fn record(
        &self,
        _provider: PaymentProvider,
        _outcome: CheckoutOutcome,
    ) -> Result<(), CheckoutMetricsError> {
        Ok(())
    }
}
