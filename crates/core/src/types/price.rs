//! Type-safe price representation using decimal arithmetic.
//!
//! The backend serializes prices as plain JSON numbers (e.g. `999.99`), so
//! [`Price`] deserializes through `rust_decimal::serde::float` rather than
//! ever touching binary floating point in arithmetic.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the currency's standard unit (dollars, not cents).
///
/// Wraps [`Decimal`] so line totals and cart totals are exact; display is
/// always rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The line total for `quantity` units at this price.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display with two-decimal rounding (e.g., `$23.50`).
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn price(v: f64) -> Price {
        Price::new(Decimal::from_f64(v).unwrap())
    }

    #[test]
    fn test_display_rounds_to_two_decimals() {
        assert_eq!(price(10.0).display(), "$10.00");
        assert_eq!(price(3.5).display(), "$3.50");
        assert_eq!(price(999.99).display(), "$999.99");
    }

    #[test]
    fn test_line_total() {
        assert_eq!(price(10.0).times(2).display(), "$20.00");
        assert_eq!(price(3.5).times(3).display(), "$10.50");
    }

    #[test]
    fn test_cart_total_sums_line_items() {
        // {price: 10, qty: 2} + {price: 3.5, qty: 1} = 23.50
        let total: Price = [price(10.0).times(2), price(3.5).times(1)]
            .into_iter()
            .sum();
        assert_eq!(total.display(), "$23.50");
    }

    #[test]
    fn test_deserializes_from_json_number() {
        let p: Price = serde_json::from_str("999.99").unwrap();
        assert_eq!(p.display(), "$999.99");
    }

    #[test]
    fn test_zero() {
        assert_eq!(Price::ZERO.display(), "$0.00");
    }
}
