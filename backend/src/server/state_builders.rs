//! Builders for the HTTP state: provider adapters and repository wiring.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use reqwest::{Client, Url};
use tracing::{info, warn};
use zeroize::Zeroizing;

use coursehub::domain::PaymentProvider;
use coursehub::domain::ports::{
    CheckoutMetrics, LogOnlyMailer, Mailer, PaymentGateway, PaymentGateways,
    UnconfiguredGateway,
};
use coursehub::inbound::http::state::{
    HttpSettings, HttpState, HttpStatePorts, Integrations, Repositories,
};
use coursehub::outbound::mail::{HttpMailer, HttpMailerConfig};
use coursehub::outbound::memory::InMemoryStore;
use coursehub::outbound::payments::{
    MPESA_SANDBOX_URL, MpesaConfig, MpesaGateway, PAYPAL_SANDBOX_URL, PayPalConfig,
    PayPalGateway, STRIPE_API_URL, StripeConfig, StripeGateway,
};
use coursehub::outbound::persistence::{
    DbPool, DieselCourseRepository, DieselPaymentRecordRepository, DieselProgressRepository,
    DieselPurchaseLedger, DieselUserRepository,
};
use coursehub::outbound::security::Argon2PasswordHasher;
use coursehub::settings::AppSettings;

use super::ServerConfig;

fn parse_url(raw: Option<&str>, default: &str, setting: &str) -> std::io::Result<Url> {
    let raw = raw.unwrap_or(default);
    Url::parse(raw)
        .map_err(|e| std::io::Error::other(format!("invalid {setting} '{raw}': {e}")))
}

fn unconfigured(provider: PaymentProvider) -> Arc<dyn PaymentGateway> {
    warn!(%provider, "payment provider credentials missing; checkout disabled");
    Arc::new(UnconfiguredGateway::new(provider))
}

fn paypal_gateway(settings: &AppSettings, client: &Client) -> std::io::Result<Arc<dyn PaymentGateway>> {
    let (Some(client_id), Some(secret)) = (
        settings.paypal_client_id.clone(),
        settings.paypal_client_secret.clone(),
    ) else {
        return Ok(unconfigured(PaymentProvider::PayPal));
    };
    let base_url = parse_url(
        settings.paypal_base_url.as_deref(),
        PAYPAL_SANDBOX_URL,
        "paypal_base_url",
    )?;
    Ok(Arc::new(PayPalGateway::new(
        client.clone(),
        PayPalConfig {
            client_id,
            client_secret: Zeroizing::new(secret),
            base_url,
        },
    )))
}

fn stripe_gateway(settings: &AppSettings, client: &Client) -> std::io::Result<Arc<dyn PaymentGateway>> {
    let Some(secret) = settings.stripe_secret_key.clone() else {
        return Ok(unconfigured(PaymentProvider::Stripe));
    };
    let base_url = parse_url(
        settings.stripe_base_url.as_deref(),
        STRIPE_API_URL,
        "stripe_base_url",
    )?;
    Ok(Arc::new(StripeGateway::new(
        client.clone(),
        StripeConfig {
            secret_key: Zeroizing::new(secret),
            base_url,
        },
    )))
}

fn mpesa_gateway(
    settings: &AppSettings,
    client: &Client,
    clock: Arc<dyn Clock>,
) -> std::io::Result<Arc<dyn PaymentGateway>> {
    let (Some(consumer_key), Some(consumer_secret), Some(shortcode), Some(passkey)) = (
        settings.mpesa_consumer_key.clone(),
        settings.mpesa_consumer_secret.clone(),
        settings.mpesa_shortcode.clone(),
        settings.mpesa_passkey.clone(),
    ) else {
        return Ok(unconfigured(PaymentProvider::Mpesa));
    };
    let base_url = parse_url(
        settings.mpesa_base_url.as_deref(),
        MPESA_SANDBOX_URL,
        "mpesa_base_url",
    )?;
    Ok(Arc::new(MpesaGateway::new(
        client.clone(),
        MpesaConfig {
            consumer_key,
            consumer_secret: Zeroizing::new(consumer_secret),
            shortcode,
            passkey: Zeroizing::new(passkey),
            base_url,
        },
        clock,
    )))
}

fn mailer(settings: &AppSettings, client: &Client) -> std::io::Result<Arc<dyn Mailer>> {
    let (Some(endpoint), Some(api_key)) =
        (settings.mail_api_url.as_deref(), settings.mail_api_key.clone())
    else {
        warn!("mail API not configured; emails will only be logged");
        return Ok(Arc::new(LogOnlyMailer));
    };
    let endpoint = parse_url(Some(endpoint), endpoint, "mail_api_url")?;
    Ok(Arc::new(HttpMailer::new(
        client.clone(),
        HttpMailerConfig {
            endpoint,
            api_key: Zeroizing::new(api_key),
            from: settings.mail_from().to_owned(),
        },
    )))
}

fn integrations(
    settings: &AppSettings,
    checkout_metrics: Arc<dyn CheckoutMetrics>,
) -> std::io::Result<Integrations> {
    let client = Client::builder()
        .timeout(settings.http_timeout())
        .build()
        .map_err(|e| std::io::Error::other(format!("http client setup failed: {e}")))?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let gateways = PaymentGateways::new(
        paypal_gateway(settings, &client)?,
        mpesa_gateway(settings, &client, Arc::clone(&clock))?,
        stripe_gateway(settings, &client)?,
    );

    Ok(Integrations {
        gateways,
        mailer: mailer(settings, &client)?,
        hasher: Arc::new(Argon2PasswordHasher::new()),
        checkout_metrics,
        clock,
        admin_emails: settings.admin_emails(),
        public_base_url: settings.public_base_url().to_owned(),
    })
}

fn build_ports(pool: Option<&DbPool>, integrations: Integrations) -> HttpStatePorts {
    match pool {
        Some(pool) => HttpStatePorts::assemble(
            Repositories {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                courses: Arc::new(DieselCourseRepository::new(pool.clone())),
                ledger: Arc::new(DieselPurchaseLedger::new(pool.clone())),
                progress: Arc::new(DieselProgressRepository::new(pool.clone())),
                records: Arc::new(DieselPaymentRecordRepository::new(pool.clone())),
            },
            integrations,
        ),
        None => {
            info!("no database configured; using the in-memory store");
            let store = Arc::new(InMemoryStore::new());
            HttpStatePorts::assemble(
                Repositories {
                    users: Arc::clone(&store),
                    courses: Arc::clone(&store),
                    ledger: Arc::clone(&store),
                    progress: Arc::clone(&store),
                    records: store,
                },
                integrations,
            )
        }
    }
}

/// Build the shared HTTP state from the server configuration.
///
/// # Errors
/// Returns [`std::io::Error`] when a provider URL is malformed or the HTTP
/// client cannot be built.
pub(crate) fn build_http_state(
    config: &ServerConfig,
    checkout_metrics: Arc<dyn CheckoutMetrics>,
) -> std::io::Result<web::Data<HttpState>> {
    let integrations = integrations(&config.settings, checkout_metrics)?;
    let ports = build_ports(config.db_pool.as_ref(), integrations);
    let settings = HttpSettings::new(
        config.settings.public_base_url(),
        config.session.cookie_secure,
    );
    Ok(web::Data::new(HttpState::new(ports, settings)))
}
