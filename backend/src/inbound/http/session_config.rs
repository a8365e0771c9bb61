//! Session cookie configuration and validation.
//!
//! Turns the session toggles loaded with the application settings into a
//! signing key and cookie attributes. Debug builds tolerate gaps with
//! warnings; release builds require every toggle and refuse ephemeral keys
//! and insecure cookies.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const FINGERPRINT_BYTES: usize = 8;
const COOKIE_SECURE_SETTING: &str = "COURSEHUB_COOKIE_SECURE";
const SAME_SITE_SETTING: &str = "COURSEHUB_SAME_SITE";
const ALLOW_EPHEMERAL_SETTING: &str = "COURSEHUB_ALLOW_EPHEMERAL_SESSION";
const SAME_SITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid session toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Raw session toggles as loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionToggles {
    pub key_file: Option<PathBuf>,
    pub cookie_secure: Option<bool>,
    pub same_site: Option<String>,
    pub allow_ephemeral: Option<bool>,
}

/// Validated session settings.
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    /// Whether session and cart cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for the session cookie.
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required setting: {name}")]
    MissingSetting { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("COURSEHUB_COOKIE_SECURE=0 is not allowed in release builds")]
    InsecureCookie,
    #[error("COURSEHUB_SAME_SITE=None requires COURSEHUB_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("COURSEHUB_ALLOW_EPHEMERAL_SESSION must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Validate `toggles` for `mode` and load the session key.
///
/// # Examples
///
/// ```rust
/// use coursehub::inbound::http::session_config::{
///     BuildMode, SessionToggles, session_settings,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_path = std::env::temp_dir().join("coursehub_session_key_example");
/// std::fs::write(&key_path, vec![b'a'; 64])?;
///
/// let toggles = SessionToggles {
///     key_file: Some(key_path.clone()),
///     cookie_secure: Some(true),
///     same_site: Some("Strict".to_owned()),
///     allow_ephemeral: Some(false),
/// };
/// let settings = session_settings(&toggles, BuildMode::Release)?;
/// assert!(settings.cookie_secure);
///
/// std::fs::remove_file(&key_path)?;
/// # Ok(())
/// # }
/// ```
pub fn session_settings(
    toggles: &SessionToggles,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = cookie_secure(toggles.cookie_secure, mode)?;
    let same_site = same_site(toggles.same_site.as_deref(), mode, cookie_secure)?;
    let allow_ephemeral = allow_ephemeral(toggles.allow_ephemeral, mode)?;
    let path = toggles
        .key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH));
    let key = session_key(&path, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// Truncated SHA-256 fingerprint of the signing key, as 16 hex characters.
///
/// Logged at start-up so operators can tell which key is active without
/// exposing it.
///
/// ```rust
/// use actix_web::cookie::Key;
/// use coursehub::inbound::http::session_config::key_fingerprint;
///
/// let fingerprint = key_fingerprint(&Key::generate());
/// assert_eq!(fingerprint.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

fn required<T>(
    value: Option<T>,
    name: &'static str,
    mode: BuildMode,
    debug_default: T,
) -> Result<T, SessionConfigError> {
    match value {
        Some(value) => Ok(value),
        None if mode.is_debug() => {
            warn!(setting = name, "session setting missing; using debug default");
            Ok(debug_default)
        }
        None => Err(SessionConfigError::MissingSetting { name }),
    }
}

fn cookie_secure(value: Option<bool>, mode: BuildMode) -> Result<bool, SessionConfigError> {
    let secure = required(value, COOKIE_SECURE_SETTING, mode, true)?;
    if !secure && !mode.is_debug() {
        return Err(SessionConfigError::InsecureCookie);
    }
    Ok(secure)
}

fn same_site(
    value: Option<&str>,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let raw = required(value, SAME_SITE_SETTING, mode, "Lax")?;

    match raw.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" if mode.is_debug() => {
            warn!("SameSite=None without secure cookies; browsers may reject the session");
            Ok(SameSite::None)
        }
        "none" => Err(SessionConfigError::InsecureSameSiteNone),
        _ if mode.is_debug() => {
            warn!(value = %raw, "invalid SameSite setting; using default");
            Ok(default_same_site)
        }
        _ => Err(SessionConfigError::InvalidSetting {
            name: SAME_SITE_SETTING,
            value: raw.to_owned(),
            expected: SAME_SITE_EXPECTED,
        }),
    }
}

fn allow_ephemeral(value: Option<bool>, mode: BuildMode) -> Result<bool, SessionConfigError> {
    let allow = required(value, ALLOW_EPHEMERAL_SETTING, mode, false)?;
    if allow && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    Ok(allow)
}

fn session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(error) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}

#[cfg(test)]
mod tests;
