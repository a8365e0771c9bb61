//! Cookie-backed shopping cart.
//!
//! Anonymous visitors keep their cart in the `cart` cookie for seven days.
//! Signed-in users keep theirs in `cart_<userId>` for thirty days. The cookie
//! value is a JSON array of course id strings. Parsing is lenient: invalid
//! JSON yields an empty cart and non-UUID entries are skipped, so a tampered
//! cookie never fails a request.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;

use super::catalogue::Course;
use super::ids::{CourseId, UserId};
use super::money::{Currency, format_price};

/// Cookie holding an anonymous visitor's cart.
pub const ANONYMOUS_CART_COOKIE: &str = "cart";
/// Lifetime of the anonymous cart cookie.
pub const ANONYMOUS_CART_TTL_DAYS: i64 = 7;
/// Lifetime of a signed-in user's cart cookie.
pub const USER_CART_TTL_DAYS: i64 = 30;

/// Cookie name for the given viewer.
///
/// # Examples
/// ```
/// use coursehub::domain::{UserId, cart_cookie_name};
///
/// assert_eq!(cart_cookie_name(None), "cart");
/// let user = UserId::parse("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
/// assert_eq!(cart_cookie_name(Some(&user)), "cart_3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// ```
#[must_use]
pub fn cart_cookie_name(user: Option<&UserId>) -> String {
    match user {
        Some(id) => format!("{ANONYMOUS_CART_COOKIE}_{id}"),
        None => ANONYMOUS_CART_COOKIE.to_owned(),
    }
}

/// Cookie lifetime in days for the given viewer.
#[must_use]
pub const fn cart_ttl_days(user: Option<&UserId>) -> i64 {
    match user {
        Some(_) => USER_CART_TTL_DAYS,
        None => ANONYMOUS_CART_TTL_DAYS,
    }
}

/// Ordered, duplicate-free list of course ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CourseId>,
}

impl Cart {
    /// Parse a cookie value, ignoring anything that is not a course id.
    #[must_use]
    pub fn from_cookie_value(raw: &str) -> Self {
        let values: Vec<serde_json::Value> = serde_json::from_str(raw).unwrap_or_default();
        let mut cart = Self::default();
        for value in values {
            if let Some(id) = value.as_str().and_then(|s| CourseId::parse(s).ok()) {
                cart.add(id);
            }
        }
        cart
    }

    /// Serialise as the JSON array stored in the cookie.
    #[must_use]
    pub fn to_cookie_value(&self) -> String {
        let ids: Vec<String> = self.items.iter().map(ToString::to_string).collect();
        serde_json::Value::from(ids).to_string()
    }

    /// Add a course, returning `false` when it was already present.
    pub fn add(&mut self, id: CourseId) -> bool {
        if self.items.contains(&id) {
            return false;
        }
        self.items.push(id);
        true
    }

    /// Remove a course, returning `false` when it was absent.
    pub fn remove(&mut self, id: &CourseId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item != id);
        self.items.len() != before
    }

    /// Append every item of `other` not already present.
    pub fn merge(&mut self, other: &Self) {
        for id in &other.items {
            self.add(*id);
        }
    }

    /// Drop every id for which `keep` returns `false`.
    pub fn retain(&mut self, keep: impl FnMut(&CourseId) -> bool) {
        self.items.retain(keep);
    }

    #[must_use]
    pub fn items(&self) -> &[CourseId] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Line item shown in the cart summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub course: Course,
    pub display_price: Option<String>,
}

/// Per-currency total for the cart summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartTotal {
    pub currency: Currency,
    pub amount: Decimal,
    pub display: String,
}

/// Priced view of a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub totals: Vec<CartTotal>,
}

impl CartSummary {
    /// Build a summary, skipping courses the viewer already owns.
    #[must_use]
    pub fn build(courses: Vec<Course>, owned: &HashSet<CourseId>) -> Self {
        let mut sums: BTreeMap<Currency, Decimal> = BTreeMap::new();
        let mut lines = Vec::new();
        for course in courses.into_iter().filter(|c| !owned.contains(&c.id)) {
            let price = course.price.unwrap_or_default();
            let entry = sums.entry(course.currency.clone()).or_default();
            *entry += price;
            lines.push(CartLine {
                display_price: course.display_price(),
                course,
            });
        }
        let totals = sums
            .into_iter()
            .map(|(currency, amount)| CartTotal {
                display: format_price(amount, &currency),
                currency,
                amount,
            })
            .collect();
        Self { lines, totals }
    }
}
