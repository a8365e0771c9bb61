//! Payment provider adapters implementing the `PaymentGateway` port.
//!
//! Each adapter translates checkout requests into one provider's REST API
//! over a shared `reqwest::Client`. Provider credentials are held in
//! `Zeroizing` buffers and never logged.

mod http_support;
mod mpesa;
mod paypal;
mod stripe;

pub use mpesa::{MPESA_SANDBOX_URL, MpesaConfig, MpesaGateway};
pub use paypal::{PAYPAL_SANDBOX_URL, PayPalConfig, PayPalGateway};
pub use stripe::{STRIPE_API_URL, StripeConfig, StripeGateway};
