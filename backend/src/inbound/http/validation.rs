//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper yields `invalid_request` with `details {field, code}` so
//! clients can highlight the offending input.

use std::fmt::Display;
use std::str::FromStr;

use serde_json::json;

use crate::domain::{Error, IdParseError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        format!("missing required field: {}", field.as_str()),
        ErrorCode::MissingField,
    )
}

/// Report a domain validation failure verbatim against `field`.
pub(crate) fn invalid_value_error(field: FieldName, reason: impl Display) -> Error {
    field_error(field, reason.to_string(), ErrorCode::InvalidValue)
}

/// Parse a typed id from a path or body value.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = IdParseError>,
{
    value.parse().map_err(|_| {
        Error::invalid_request(format!("{} must be a valid UUID", field.as_str())).with_details(
            json!({
                "field": field.as_str(),
                "value": value,
                "code": ErrorCode::InvalidUuid.as_str(),
            }),
        )
    })
}

/// Parse an optional typed id, treating blank strings as absent.
pub(crate) fn parse_optional_id<T>(value: Option<&str>, field: FieldName) -> Result<Option<T>, Error>
where
    T: FromStr<Err = IdParseError>,
{
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_id(raw, field))
        .transpose()
}

/// Require a non-blank string, returning it trimmed.
pub(crate) fn require_text(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| missing_field_error(field))
}
