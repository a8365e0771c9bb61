//! Currency codes, price validation and display formatting.
//!
//! Amounts are [`Decimal`] values in major units. Storage keeps two decimal
//! places (`minor units = amount * 100`) regardless of currency; payment
//! adapters convert to whatever unit their provider expects.

use std::fmt;

use rust_decimal::prelude::ToPrimitive as _;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Scale used when persisting prices.
pub const STORAGE_SCALE: u32 = 2;

/// Errors raised while validating money values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("currency must be a three letter ISO 4217 code")]
    InvalidCurrency,
    #[error("price must not be negative")]
    NegativeAmount,
    #[error("price must have at most two decimal places")]
    TooPrecise,
    #[error("price is out of range")]
    OutOfRange,
}

/// ISO 4217 currency code, upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate a currency code.
    ///
    /// # Examples
    /// ```
    /// use coursehub::domain::Currency;
    ///
    /// assert_eq!(Currency::new("kes").unwrap().as_str(), "KES");
    /// assert!(Currency::new("shillings").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, MoneyError> {
        let code = raw.as_ref().trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(MoneyError::InvalidCurrency)
        }
    }

    /// US dollars, the default course currency.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_owned())
    }

    /// Kenyan shillings, required for M-PESA checkouts.
    #[must_use]
    pub fn kes() -> Self {
        Self("KES".to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_kes(&self) -> bool {
        self.0 == "KES"
    }

    /// Decimal places shown when formatting.
    #[must_use]
    pub fn display_places(&self) -> u32 {
        if self.is_kes() { 0 } else { 2 }
    }

    fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" => Some("$"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validate a course price: non-negative with at most two decimal places.
pub fn validate_price(amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::NegativeAmount);
    }
    let normalized = amount.normalize();
    if normalized.scale() > STORAGE_SCALE {
        return Err(MoneyError::TooPrecise);
    }
    to_storage_units(normalized)?;
    Ok(normalized)
}

/// Convert a price into the stored minor-unit integer.
pub fn to_storage_units(amount: Decimal) -> Result<i64, MoneyError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|scaled| scaled.to_i64())
        .ok_or(MoneyError::OutOfRange)
}

/// Convert a stored minor-unit integer back into a price.
#[must_use]
pub fn from_storage_units(minor: i64) -> Decimal {
    Decimal::new(minor, STORAGE_SCALE)
}

/// Round to whole currency units with a floor of one, as mobile money
/// providers reject fractional and zero amounts.
pub fn whole_units_at_least_one(amount: Decimal) -> Result<i64, MoneyError> {
    let whole = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(MoneyError::OutOfRange)?;
    Ok(whole.max(1))
}

/// Render an amount for display.
///
/// `KES` uses no decimals and a `KES ` prefix; `USD`, `EUR` and `GBP` use
/// their symbol; any other code is prefixed with the code. Rounding is
/// half away from zero.
///
/// # Examples
/// ```
/// use coursehub::domain::{Currency, format_price};
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_price(Decimal::new(45690, 0), &Currency::kes()), "KES 45,690");
/// assert_eq!(format_price(Decimal::new(2999, 2), &Currency::usd()), "$29.99");
/// ```
#[must_use]
pub fn format_price(amount: Decimal, currency: &Currency) -> String {
    let places = currency.display_places();
    let mut rounded =
        amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };
    let mut number = group_thousands(whole);
    if let Some(fraction) = fraction {
        number.push('.');
        number.push_str(fraction);
    }
    let sign = if negative { "-" } else { "" };
    match currency.symbol() {
        Some(symbol) => format!("{sign}{symbol}{number}"),
        None => format!("{sign}{} {number}", currency.as_str()),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
