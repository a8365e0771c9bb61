//! Authentication primitives such as login credentials and registrations.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use zeroize::Zeroizing;

use super::user::{DisplayName, Email, UserValidationError};

/// Minimum accepted password length for new accounts.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Domain error returned when login or registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// Email was missing or malformed.
    #[error(transparent)]
    Email(#[from] UserValidationError),
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_LEN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised via [`Email::new`].
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use coursehub::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@example.com", "secret").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for user lookups.
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: Email,
    display_name: DisplayName,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate the raw registration fields.
    pub fn try_from_parts(
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        let display_name = DisplayName::new(display_name)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialsValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }
        Ok(Self {
            email,
            display_name,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub const fn email(&self) -> &Email {
        &self.email
    }

    pub const fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
