//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Money value object, in the store's single base currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }
    pub fn apply_rate(&self, rate: TaxRate) -> Money { Money(self.0 * rate.value()) }

    /// Whole centavos, half away from zero. Stored amounts are kept at this scale.
    pub fn round_to_cents(&self) -> Money { Money(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, other: Money) -> Money { Money(self.0 + other.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

/// Tax rate as a fraction, e.g. `0.12` for 12% VAT.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
    pub fn new(value: Decimal) -> Result<Self, TaxRateError> {
        if value < Decimal::ZERO || value > Decimal::ONE { return Err(TaxRateError::OutOfRange(value)); }
        Ok(Self(value))
    }
    pub fn value(&self) -> Decimal { self.0 }
}

/// 12% VAT.
impl Default for TaxRate {
    fn default() -> Self { Self(Decimal::new(12, 2)) }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = TaxRateError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Decimal { rate.0 }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TaxRateError {
    #[error("tax rate {0} must be between 0 and 1")]
    OutOfRange(Decimal),
}
