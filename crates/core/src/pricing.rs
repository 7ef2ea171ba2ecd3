//! Pricing
//!
//! Prices are stored as exact euro minor units. Formatting and the
//! included-VAT breakdown are display-only concerns; stored totals stay
//! integral and unrounded.

use std::ops::Deref;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso};
use thiserror::Error;

/// Represents a price in euro cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    value: u64,
}

impl Price {
    /// Creates a new price from minor units (cents).
    #[must_use]
    pub const fn from_minor(value: u64) -> Self {
        Price { value }
    }

    /// The price in minor units.
    #[must_use]
    pub const fn minor_units(self) -> u64 {
        self.value
    }
}

impl Deref for Price {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// Errors from pricing display calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Decimal arithmetic overflowed or the result was not representable.
    #[error("amount conversion overflowed or was not representable")]
    Conversion,
}

/// Standard VAT rate included in all sticker prices.
#[must_use]
pub fn vat_rate() -> Percentage {
    Percentage::from(0.24)
}

/// Format a minor-unit euro amount for display, e.g. `4,99` with the euro
/// symbol. Rounding to two decimal places happens here only; callers keep
/// the exact minor-unit value.
#[must_use]
pub fn format_eur(minor: u64) -> String {
    let minor = i64::try_from(minor).unwrap_or(i64::MAX);

    Money::from_minor(minor, iso::EUR).to_string()
}

/// Calculate the VAT share already included in a gross minor-unit amount.
///
/// For a gross amount carrying rate `r`, the included tax is
/// `gross * r / (1 + r)`, rounded midpoint-away-from-zero to whole minor
/// units.
///
/// # Errors
///
/// Returns [`PricingError::Conversion`] when the decimal arithmetic
/// overflows or the result cannot be represented as minor units.
pub fn vat_included_portion(gross_minor: u64, rate: Percentage) -> Result<u64, PricingError> {
    let gross = Decimal::from_u64(gross_minor).ok_or(PricingError::Conversion)?;
    let rate = rate * Decimal::ONE;
    let divisor = Decimal::ONE
        .checked_add(rate)
        .ok_or(PricingError::Conversion)?;

    gross
        .checked_mul(rate)
        .ok_or(PricingError::Conversion)?
        .checked_div(divisor)
        .ok_or(PricingError::Conversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(PricingError::Conversion)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_price() {
        let price = Price::from_minor(1000);

        assert_eq!(price.minor_units(), 1000);
    }

    #[test]
    fn price_derefs_to_u64() {
        let price = Price::from_minor(100);

        assert_eq!(*price, 100);
    }

    #[test]
    fn format_eur_matches_money_display() {
        assert_eq!(
            format_eur(4_99),
            Money::from_minor(499, iso::EUR).to_string()
        );
    }

    #[test]
    fn format_eur_carries_the_euro_symbol() {
        let formatted = format_eur(14_97);

        assert!(
            formatted.contains('€'),
            "expected euro symbol in {formatted}"
        );
        assert!(formatted.contains("14"), "expected euros in {formatted}");
        assert!(formatted.contains("97"), "expected cents in {formatted}");
    }

    #[test]
    fn vat_included_portion_of_round_gross() -> TestResult {
        // 12.40 gross at 24% included -> 2.40 tax.
        let vat = vat_included_portion(12_40, vat_rate())?;

        assert_eq!(vat, 2_40);

        Ok(())
    }

    #[test]
    fn vat_included_portion_rounds_midpoint_away_from_zero() -> TestResult {
        // 14.97 gross at 24% -> 289.74... cents, rounded to 290.
        let vat = vat_included_portion(14_97, vat_rate())?;

        assert_eq!(vat, 2_90);

        Ok(())
    }

    #[test]
    fn vat_included_portion_of_zero_is_zero() -> TestResult {
        let vat = vat_included_portion(0, vat_rate())?;

        assert_eq!(vat, 0);

        Ok(())
    }
}
