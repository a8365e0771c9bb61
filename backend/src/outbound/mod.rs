//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel
//! - **memory**: process-local repositories for development and tests
//! - **payments**: PayPal, Stripe and M-PESA REST gateways
//! - **mail**: JSON mail API delivery
//! - **security**: argon2 password hashing
//! - **metrics**: Prometheus-backed metrics exporters (feature-gated)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod mail;
pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod payments;
pub mod persistence;
pub mod security;
