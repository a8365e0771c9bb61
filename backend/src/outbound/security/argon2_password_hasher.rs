//! Argon2id password hashing.

use argon2::password_hash::{self, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use rand::rngs::OsRng;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Argon2id with the crate's default parameters, producing PHC strings.
#[derive(Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| PasswordHashError::malformed_hash(err.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordHashError::hash(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new()
    }

    #[rstest]
    fn hashes_verify_their_own_password(hasher: Argon2PasswordHasher) {
        let hash = hasher.hash("correct horse battery").expect("hashes");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery", &hash).expect("verifies"));
        assert!(!hasher.verify("wrong", &hash).expect("verifies"));
    }

    #[rstest]
    fn salts_differ_between_hashes(hasher: Argon2PasswordHasher) {
        let first = hasher.hash("same").expect("hashes");
        let second = hasher.hash("same").expect("hashes");
        assert_ne!(first, second);
    }

    #[rstest]
    fn malformed_hashes_are_reported(hasher: Argon2PasswordHasher) {
        let err = hasher.verify("pw", "not-a-phc-string").expect_err("malformed");
        assert!(matches!(err, PasswordHashError::MalformedHash { .. }));
    }
}
