//! Application settings loaded via OrthoConfig.
//!
//! Values merge CLI flags, `COURSEHUB_*` environment variables and config
//! files. Provider credentials are optional; a provider without them is
//! wired to a gateway that refuses every request.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;

use crate::domain::Email;
use crate::inbound::http::session_config::SessionToggles;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAIL_FROM: &str = "CourseHub <no-reply@coursehub.local>";

/// Configuration values for the CourseHub server.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "COURSEHUB")]
pub struct AppSettings {
    /// Interface to listen on.
    pub host: Option<IpAddr>,
    /// TCP port to listen on.
    pub port: Option<u16>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Seconds to wait for a free database connection.
    pub db_connect_timeout_secs: Option<u64>,
    /// Browser-facing origin used for redirects, emails and provider return URLs.
    pub public_base_url: Option<String>,

    /// Session signing key file.
    pub session_key_file: Option<PathBuf>,
    /// Mark session and cart cookies `Secure`.
    pub cookie_secure: Option<bool>,
    /// `SameSite` policy for the session cookie.
    pub same_site: Option<String>,
    /// Permit a generated session key when the key file is missing.
    pub allow_ephemeral_session: Option<bool>,

    /// Timeout for outbound provider calls, in seconds.
    pub http_timeout_secs: Option<u64>,

    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    pub paypal_base_url: Option<String>,

    pub stripe_secret_key: Option<String>,
    pub stripe_base_url: Option<String>,

    pub mpesa_consumer_key: Option<String>,
    pub mpesa_consumer_secret: Option<String>,
    pub mpesa_shortcode: Option<String>,
    pub mpesa_passkey: Option<String>,
    pub mpesa_base_url: Option<String>,

    /// JSON mail API endpoint; emails are only logged when absent.
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: Option<String>,

    /// Comma-separated emails granted the admin role on registration.
    pub admin_emails: Option<String>,
}

impl AppSettings {
    /// Socket address to bind, defaulting to `0.0.0.0:8080`.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Public origin without a trailing slash.
    #[must_use]
    pub fn public_base_url(&self) -> &str {
        self.public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL)
            .trim_end_matches('/')
    }

    /// Pool settings for the configured database, if any.
    #[must_use]
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?;
        let mut config = PoolConfig::new(url);
        if let Some(max) = self.db_max_connections {
            config = config.with_max_size(max.max(1));
        }
        if let Some(secs) = self.db_connect_timeout_secs {
            config = config.with_connection_timeout(Duration::from_secs(secs));
        }
        Some(config)
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn mail_from(&self) -> &str {
        self.mail_from.as_deref().unwrap_or(DEFAULT_MAIL_FROM)
    }

    /// Parsed admin emails. Malformed entries are skipped with a warning.
    #[must_use]
    pub fn admin_emails(&self) -> Vec<Email> {
        self.admin_emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .filter_map(|raw| match Email::new(raw) {
                Ok(email) => Some(email),
                Err(error) => {
                    warn!(value = raw, %error, "ignoring malformed admin email");
                    None
                }
            })
            .collect()
    }

    /// Session toggles for [`crate::inbound::http::session_config`].
    #[must_use]
    pub fn session_toggles(&self) -> SessionToggles {
        SessionToggles {
            key_file: self.session_key_file.clone(),
            cookie_secure: self.cookie_secure,
            same_site: self.same_site.clone(),
            allow_ephemeral: self.allow_ephemeral_session,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 7] = [
        "COURSEHUB_PORT",
        "COURSEHUB_DATABASE_URL",
        "COURSEHUB_DB_MAX_CONNECTIONS",
        "COURSEHUB_DB_CONNECT_TIMEOUT_SECS",
        "COURSEHUB_PUBLIC_BASE_URL",
        "COURSEHUB_ADMIN_EMAILS",
        "COURSEHUB_COOKIE_SECURE",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("coursehub")]).expect("config should load")
    }

    #[rstest]
    fn defaults_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(settings.public_base_url(), DEFAULT_PUBLIC_BASE_URL);
        assert!(settings.database_url.is_none());
        assert!(settings.pool_config().is_none());
        assert!(settings.admin_emails().is_empty());
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("COURSEHUB_PORT", Some("9090".to_owned())),
            (
                "COURSEHUB_DATABASE_URL",
                Some("postgres://localhost/coursehub".to_owned()),
            ),
            (
                "COURSEHUB_PUBLIC_BASE_URL",
                Some("https://learn.example/".to_owned()),
            ),
            (
                "COURSEHUB_ADMIN_EMAILS",
                Some("Root@Example.com, ,not-an-email".to_owned()),
            ),
            ("COURSEHUB_COOKIE_SECURE", Some("false".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().port(), 9090);
        assert_eq!(settings.public_base_url(), "https://learn.example");
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/coursehub")
        );
        let admins = settings.admin_emails();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].as_ref(), "root@example.com");
        assert_eq!(settings.session_toggles().cookie_secure, Some(false));
    }

    #[rstest]
    fn pool_tuning_follows_the_environment() {
        let _guard = lock_env([
            (
                "COURSEHUB_DATABASE_URL",
                Some("postgres://localhost/coursehub".to_owned()),
            ),
            ("COURSEHUB_DB_MAX_CONNECTIONS", Some("0".to_owned())),
            ("COURSEHUB_DB_CONNECT_TIMEOUT_SECS", Some("5".to_owned())),
        ]);

        let config = load_from_empty_args()
            .pool_config()
            .expect("database configured");
        assert_eq!(config.database_url(), "postgres://localhost/coursehub");
        assert_eq!(config.max_size(), 1);
        assert_eq!(config.connection_timeout(), Duration::from_secs(5));
    }
}
