use rust_decimal::Decimal;

use storefront_core::{DomainResult, ExchangeRate, Money};

/// Price of one sale in the reference currency plus its display conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub unit_price: Money,
    pub quantity: u32,
    pub total: Money,
    pub total_display: Decimal,
}

impl Quote {
    pub fn new(unit_price: Money, quantity: u32, rate: ExchangeRate) -> DomainResult<Self> {
        let total = unit_price.times(quantity)?;
        Ok(Self {
            unit_price,
            quantity,
            total,
            total_display: rate.to_display(total),
        })
    }

    /// `₹<total> (INR) / $<usd> (USD)`.
    pub fn render(&self) -> String {
        format!("{} (INR) / ${:.2} (USD)", self.total, self.total_display)
    }
}
