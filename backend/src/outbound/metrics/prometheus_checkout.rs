//! Prometheus adapter for checkout outcome metrics.

use async_trait::async_trait;
use prometheus::{CounterVec, Opts, Registry};

use crate::domain::PaymentProvider;
use crate::domain::ports::{CheckoutMetrics, CheckoutMetricsError, CheckoutOutcome};

/// Counts checkout outcomes per provider.
///
/// - **Name**: `coursehub_checkout_outcomes_total`
/// - **Labels**: `provider` (`paypal`, `mpesa`, `stripe`) and `outcome`
///   (`order_created`, `enrolled`, `already_enrolled`, `failed`,
///   `cancelled`)
pub struct PrometheusCheckoutMetrics {
    outcomes_total: CounterVec,
}

impl PrometheusCheckoutMetrics {
    /// Create the counter and register it with `registry`.
    ///
    /// # Errors
    ///
    /// Fails when a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let outcomes_total = CounterVec::new(
            Opts::new(
                "coursehub_checkout_outcomes_total",
                "Checkout outcomes by payment provider",
            ),
            &["provider", "outcome"],
        )?;
        registry.register(Box::new(outcomes_total.clone()))?;
        Ok(Self { outcomes_total })
    }
}

#[async_trait]
impl CheckoutMetrics for PrometheusCheckoutMetrics {
    async fn record(
        &self,
        provider: PaymentProvider,
        outcome: CheckoutOutcome,
    ) -> Result<(), CheckoutMetricsError> {
        self.outcomes_total
            .get_metric_with_label_values(&[provider.as_str(), outcome.as_label()])
            .map_err(|err| CheckoutMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }
}
