//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use coursehub::inbound::http::health::HealthState;
use coursehub::inbound::http::session_config::{BuildMode, key_fingerprint, session_settings};
use coursehub::outbound::persistence::{DbPool, run_pending_migrations};
use coursehub::settings::AppSettings;

#[cfg(feature = "metrics")]
use server::make_metrics;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| eyre!("failed to load settings: {e}"))?;
    let session = session_settings(&settings.session_toggles(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session key loaded"
    );

    let mut config = ServerConfig::new(session, settings.clone());
    if let Some(pool_config) = settings.pool_config() {
        run_pending_migrations(pool_config.database_url())
            .await
            .wrap_err("failed to apply database migrations")?;
        let pool = DbPool::new(pool_config)
            .await
            .wrap_err("failed to create database pool")?;
        config = config.with_db_pool(pool);
    }
    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(make_metrics()?));
    }

    info!(addr = %config.bind_addr(), "starting server");
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await?;
    Ok(())
}
