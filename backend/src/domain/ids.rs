//! Strongly typed UUID identifiers for marketplace entities.
//!
//! Each identifier serialises as its hyphenated UUID string so JSON payloads,
//! cookies and database rows share one representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID")]
pub struct IdParseError {
    kind: &'static str,
}

impl IdParseError {
    /// Name of the identifier kind that failed to parse.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse a hyphenated or simple UUID string.
            ///
            /// # Errors
            /// Returns [`IdParseError`] when `raw` is not a UUID.
            pub fn parse(raw: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| IdParseError { kind: $kind })
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

uuid_id!(
    /// Stable user identifier.
    UserId,
    "user id"
);
uuid_id!(
    /// Course identifier.
    CourseId,
    "course id"
);
uuid_id!(
    /// Chapter identifier.
    ChapterId,
    "chapter id"
);
uuid_id!(
    /// Category identifier.
    CategoryId,
    "category id"
);
uuid_id!(
    /// Course attachment identifier.
    AttachmentId,
    "attachment id"
);
uuid_id!(
    /// Payment record identifier.
    PaymentRecordId,
    "payment record id"
);
