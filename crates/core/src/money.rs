//! Amounts in the store's reference currency and their display conversion.
//!
//! Prices are kept as exact decimals in the reference currency (INR). A
//! secondary amount (USD) is derived from a fixed exchange factor for display
//! only; nothing is ever stored in the display currency.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A non-negative amount in the reference currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        Ok(Self(amount))
    }

    /// Parse a user-supplied amount such as `100`, `99.5` or `1e2`.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let trimmed = input.trim();
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| DomainError::validation(format!("`{trimmed}` is not a valid amount")))?;
        Self::new(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply a unit price by a quantity.
    pub fn times(self, quantity: u32) -> DomainResult<Money> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount too large"))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "₹{:.2}", self.0.round_dp(2))
    }
}

/// Fixed conversion factor: `display = reference / rate`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    /// INR per USD used by the store.
    pub const DEFAULT: ExchangeRate = ExchangeRate(Decimal::from_parts(832, 0, 0, false, 1));

    pub fn new(rate: Decimal) -> DomainResult<Self> {
        if rate <= Decimal::ZERO {
            return Err(DomainError::validation("exchange rate must be positive"));
        }
        Ok(Self(rate))
    }

    pub fn rate(&self) -> Decimal {
        self.0
    }

    /// Convert a reference amount to the display currency, two decimals.
    pub fn to_display(&self, money: Money) -> Decimal {
        // The constructor rejects zero, so the division cannot fail.
        (money.amount() / self.0).round_dp(2)
    }

    /// Render an amount in both currencies, e.g. `₹200.00 (INR) / $2.40 (USD)`.
    pub fn dual(&self, money: Money) -> String {
        format!("{money} (INR) / ${:.2} (USD)", self.to_display(money))
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_is_83_point_2() {
        assert_eq!(ExchangeRate::DEFAULT.rate(), Decimal::from_str("83.2").unwrap());
    }

    #[test]
    fn parse_accepts_plain_and_fractional_amounts() {
        assert_eq!(Money::parse("100").unwrap().amount(), Decimal::from(100));
        assert_eq!(Money::parse(" 99.5 ").unwrap().amount(), Decimal::from_str("99.5").unwrap());
    }

    #[test]
    fn parse_rejects_negative_and_garbage() {
        assert!(matches!(Money::parse("-1"), Err(DomainError::Validation(_))));
        assert!(matches!(Money::parse("ten"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn times_multiplies_unit_price() {
        let unit = Money::parse("100.0").unwrap();
        assert_eq!(unit.times(2).unwrap().amount(), Decimal::from(200));
    }

    #[test]
    fn times_rejects_overflowing_totals() {
        let unit = Money::new(Decimal::MAX).unwrap();
        assert!(matches!(unit.times(2), Err(DomainError::Validation(_))));
        assert_eq!(unit.times(1).unwrap(), unit);
    }

    #[test]
    fn dual_renders_both_currencies_with_two_decimals() {
        let total = Money::parse("200").unwrap();
        assert_eq!(
            ExchangeRate::DEFAULT.dual(total),
            "₹200.00 (INR) / $2.40 (USD)"
        );
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(ExchangeRate::new(Decimal::ZERO).is_err());
    }
}
