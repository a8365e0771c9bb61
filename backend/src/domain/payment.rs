//! Payment providers, payment records and phone number normalisation.
//!
//! Payment records are an advisory audit log. The purchase row is the only
//! entitlement signal; records never grant access on their own.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::ids::{CourseId, PaymentRecordId, UserId};
use super::money::Currency;

/// Supported payment providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    #[serde(rename = "paypal")]
    PayPal,
    Mpesa,
    Stripe,
}

/// Error raised when a provider name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported payment provider: {value}")]
pub struct UnknownProvider {
    value: String,
}

impl PaymentProvider {
    /// Lower-case path and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PayPal => "paypal",
            Self::Mpesa => "mpesa",
            Self::Stripe => "stripe",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paypal" => Ok(Self::PayPal),
            "mpesa" | "m-pesa" => Ok(Self::Mpesa),
            "stripe" => Ok(Self::Stripe),
            other => Err(UnknownProvider {
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle state of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Error raised when a stored status is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status: {value}")]
pub struct UnknownStatus {
    value: String,
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// Stored payment attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub id: PaymentRecordId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub provider: PaymentProvider,
    /// Provider-side order, session or checkout request id.
    pub reference: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment record about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub provider: PaymentProvider,
    pub reference: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub metadata: Value,
}

impl NewPaymentRecord {
    /// Materialise the record with a fresh id and timestamps.
    #[must_use]
    pub fn into_record(self, now: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            id: PaymentRecordId::random(),
            user_id: self.user_id,
            course_id: self.course_id,
            provider: self.provider,
            reference: self.reference,
            amount: self.amount,
            currency: self.currency,
            status: self.status,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of writing a completed payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionWrite {
    /// The record was inserted or moved into `completed`.
    Recorded,
    /// A completed record for this reference already existed.
    AlreadyCompleted,
}

/// Errors raised while normalising a phone number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneNumberError {
    #[error("phone number must not be empty")]
    Empty,
    #[error("phone number must be a Kenyan mobile number (07XX, 01XX or 254...)")]
    Invalid,
}

/// Kenyan mobile number in the `2547XXXXXXXX` / `2541XXXXXXXX` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalise local (`07..`, `01..`), bare (`7..`) and international
    /// (`+254..`) forms.
    ///
    /// # Examples
    /// ```
    /// use coursehub::domain::PhoneNumber;
    ///
    /// assert_eq!(PhoneNumber::normalize("0712 345 678").unwrap().as_str(), "254712345678");
    /// assert!(PhoneNumber::normalize("0812345678").is_err());
    /// ```
    pub fn normalize(raw: &str) -> Result<Self, PhoneNumberError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PhoneNumberError::Empty);
        }
        let digits: String = trimmed
            .trim_start_matches('+')
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneNumberError::Invalid);
        }
        let international = if let Some(local) = digits.strip_prefix('0') {
            format!("254{local}")
        } else if digits.len() == 9 {
            format!("254{digits}")
        } else {
            digits
        };
        let valid = international.len() == 12
            && (international.starts_with("2547") || international.starts_with("2541"));
        if valid {
            Ok(Self(international))
        } else {
            Err(PhoneNumberError::Invalid)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
