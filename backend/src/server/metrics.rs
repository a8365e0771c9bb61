//! Prometheus middleware and checkout counters.

use std::sync::Arc;

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use coursehub::domain::ports::CheckoutMetrics;
use coursehub::outbound::metrics::PrometheusCheckoutMetrics;

/// Build the request metrics middleware serving `/metrics`.
pub(crate) fn make_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("coursehub")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(format!("prometheus metrics setup failed: {e}")))
}

/// Register checkout counters on the middleware registry.
pub(crate) fn checkout_metrics(
    prometheus: &PrometheusMetrics,
) -> std::io::Result<Arc<dyn CheckoutMetrics>> {
    let metrics = PrometheusCheckoutMetrics::new(&prometheus.registry).map_err(|e| {
        std::io::Error::other(format!("checkout metrics registration failed: {e}"))
    })?;
    Ok(Arc::new(metrics))
}
