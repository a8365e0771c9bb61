//! User data model: identities, roles and validated profile fields.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use super::ids::UserId;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must be a valid address")]
    InvalidEmail,
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
    #[error("unknown role: {value}")]
    UnknownRole { value: String },
    #[error("image url must be an absolute http(s) URL")]
    InvalidImageUrl,
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Lower-cased email address used as the login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use coursehub::domain::Email;
    ///
    /// let email = Email::new("  Ada@Example.COM ").unwrap();
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(trimmed) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`], trimming outer whitespace.
    pub fn new(display_name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = display_name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validate an optional profile image URL.
pub fn validate_image_url(raw: &str) -> Result<String, UserValidationError> {
    let parsed = url::Url::parse(raw.trim()).map_err(|_| UserValidationError::InvalidImageUrl)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        _ => Err(UserValidationError::InvalidImageUrl),
    }
}

/// Marketplace role controlling authoring and administration rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role for registered accounts.
    Student,
    /// May author and publish courses.
    Teacher,
    /// Full administrative access.
    Admin,
}

impl Role {
    /// Lower-case storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }

    /// Whether the role may create and edit courses.
    #[must_use]
    pub const fn can_author(self) -> bool {
        matches!(self, Self::Teacher | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// Application user.
///
/// ## Invariants
/// - `email` is lower-cased and unique across users.
/// - `billing_customer_id` is only set once a payment provider has issued a
///   customer reference for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    display_name: DisplayName,
    role: Role,
    billing_customer_id: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a new [`User`] from validated components.
    #[must_use]
    pub const fn new(
        id: UserId,
        email: Email,
        display_name: DisplayName,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            display_name,
            role,
            billing_customer_id: None,
            image_url: None,
            created_at,
        }
    }

    /// Attach a provider customer reference.
    #[must_use]
    pub fn with_billing_customer(mut self, customer_id: Option<String>) -> Self {
        self.billing_customer_id = customer_id;
        self
    }

    /// Attach a profile image.
    #[must_use]
    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    /// Replace the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: DisplayName) -> Self {
        self.display_name = display_name;
        self
    }

    /// Replace the role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub const fn id(&self) -> &UserId {
        &self.id
    }
    pub const fn email(&self) -> &Email {
        &self.email
    }
    pub const fn display_name(&self) -> &DisplayName {
        &self.display_name
    }
    pub const fn role(&self) -> Role {
        self.role
    }
    pub fn billing_customer_id(&self) -> Option<&str> {
        self.billing_customer_id.as_deref()
    }
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests;
