//! Unit tests for session configuration validation.

use super::*;
use rstest::{fixture, rstest};
use uuid::Uuid;

#[derive(Debug)]
struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("coursehub-session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'a'; len]).expect("write temporary key");
        Self { path }
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[fixture]
fn key_file() -> TempKeyFile {
    TempKeyFile::new(SESSION_KEY_MIN_LEN)
}

fn release_toggles(key_file: &TempKeyFile) -> SessionToggles {
    SessionToggles {
        key_file: Some(key_file.path.clone()),
        cookie_secure: Some(true),
        same_site: Some("Strict".to_owned()),
        allow_ephemeral: Some(false),
    }
}

fn expect_error(toggles: &SessionToggles, mode: BuildMode) -> SessionConfigError {
    match session_settings(toggles, mode) {
        Ok(_) => panic!("expected session configuration to be rejected"),
        Err(error) => error,
    }
}

#[rstest]
fn release_valid_settings_succeed(key_file: TempKeyFile) {
    let settings = session_settings(&release_toggles(&key_file), BuildMode::Release)
        .expect("valid release settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
#[case::cookie_secure(SessionToggles { cookie_secure: None, ..SessionToggles::default() }, COOKIE_SECURE_SETTING)]
#[case::same_site(SessionToggles { cookie_secure: Some(true), ..SessionToggles::default() }, SAME_SITE_SETTING)]
#[case::allow_ephemeral(
    SessionToggles {
        cookie_secure: Some(true),
        same_site: Some("Lax".to_owned()),
        ..SessionToggles::default()
    },
    ALLOW_EPHEMERAL_SETTING
)]
fn release_requires_every_toggle(#[case] toggles: SessionToggles, #[case] expected: &str) {
    let error = expect_error(&toggles, BuildMode::Release);
    assert!(matches!(error, SessionConfigError::MissingSetting { name } if name == expected));
}

#[rstest]
fn release_rejects_insecure_cookies(key_file: TempKeyFile) {
    let toggles = SessionToggles {
        cookie_secure: Some(false),
        ..release_toggles(&key_file)
    };
    assert!(matches!(
        expect_error(&toggles, BuildMode::Release),
        SessionConfigError::InsecureCookie
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(key_file: TempKeyFile) {
    let toggles = SessionToggles {
        allow_ephemeral: Some(true),
        ..release_toggles(&key_file)
    };
    assert!(matches!(
        expect_error(&toggles, BuildMode::Release),
        SessionConfigError::EphemeralNotAllowed
    ));
}

#[rstest]
fn release_rejects_unknown_same_site(key_file: TempKeyFile) {
    let toggles = SessionToggles {
        same_site: Some("sometimes".to_owned()),
        ..release_toggles(&key_file)
    };
    assert!(matches!(
        expect_error(&toggles, BuildMode::Release),
        SessionConfigError::InvalidSetting { name: SAME_SITE_SETTING, .. }
    ));
}

#[rstest]
fn release_requires_a_readable_key() {
    let toggles = SessionToggles {
        key_file: Some(std::env::temp_dir().join(format!("missing-{}", Uuid::new_v4()))),
        cookie_secure: Some(true),
        same_site: Some("Strict".to_owned()),
        allow_ephemeral: Some(false),
    };
    assert!(matches!(
        expect_error(&toggles, BuildMode::Release),
        SessionConfigError::KeyRead { .. }
    ));
}

#[rstest]
fn release_rejects_short_keys() {
    let short = TempKeyFile::new(32);
    assert!(matches!(
        expect_error(&release_toggles(&short), BuildMode::Release),
        SessionConfigError::KeyTooShort { length: 32, .. }
    ));
}

#[rstest]
fn debug_defaults_allow_ephemeral_key() {
    let toggles = SessionToggles {
        key_file: Some(std::env::temp_dir().join(format!("missing-{}", Uuid::new_v4()))),
        ..SessionToggles::default()
    };
    let settings = session_settings(&toggles, BuildMode::Debug).expect("debug defaults");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case("none", SameSite::None)]
#[case("bogus", SameSite::Lax)]
fn debug_tolerates_loose_same_site(key_file: TempKeyFile, #[case] raw: &str, #[case] expected: SameSite) {
    let toggles = SessionToggles {
        cookie_secure: Some(false),
        same_site: Some(raw.to_owned()),
        ..release_toggles(&key_file)
    };
    let settings = session_settings(&toggles, BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.same_site, expected);
}

#[rstest]
fn fingerprints_are_stable_and_distinct() {
    let first = Key::derive_from(&[b'a'; 64]);
    let second = Key::derive_from(&[b'b'; 64]);

    assert_eq!(key_fingerprint(&first), key_fingerprint(&first));
    assert_ne!(key_fingerprint(&first), key_fingerprint(&second));
    assert!(key_fingerprint(&first).chars().all(|c| c.is_ascii_hexdigit()));
}
