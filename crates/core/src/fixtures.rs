//! Catalog Fixtures
//!
//! YAML-driven featured-sticker catalog used by the demo shell and tests.

use std::{fs, path::Path};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    pricing::Price,
    stickers::{ImageSource, Sticker},
};

/// Errors raised while loading a catalog fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Fixture file could not be read.
    #[error("failed to read fixture file")]
    Io(#[from] std::io::Error),

    /// Fixture YAML could not be parsed.
    #[error("failed to parse fixture YAML")]
    Yaml(#[from] serde_norway::Error),

    /// Price string was not in the form `AMOUNT CURRENCY`.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// The storefront only trades in euros.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

/// Wrapper for the featured catalog in YAML.
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Featured stickers in display order.
    pub stickers: Vec<StickerFixture>,
}

/// A single featured sticker entry.
#[derive(Debug, Deserialize)]
pub struct StickerFixture {
    /// Prompt or blurb describing the artwork.
    pub prompt: String,

    /// Artwork URI.
    pub image: String,

    /// Price (e.g., "4.99 EUR").
    pub price: String,
}

impl TryFrom<StickerFixture> for Sticker {
    type Error = FixtureError;

    fn try_from(fixture: StickerFixture) -> Result<Self, Self::Error> {
        let price = parse_price(&fixture.price)?;

        Ok(Sticker::new(
            ImageSource::Uri(fixture.image),
            fixture.prompt,
            price,
        ))
    }
}

/// Load a featured catalog from a YAML string.
///
/// # Errors
///
/// Returns an error when the YAML cannot be parsed or a price entry is
/// malformed.
pub fn load_catalog_str(yaml: &str) -> Result<Vec<Sticker>, FixtureError> {
    let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

    fixture.stickers.into_iter().map(Sticker::try_from).collect()
}

/// Load a featured catalog from a YAML file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or its contents are
/// malformed.
pub fn load_catalog_path(path: &Path) -> Result<Vec<Sticker>, FixtureError> {
    let yaml = fs::read_to_string(path)?;

    load_catalog_str(&yaml)
}

/// Parse a price string (e.g., `"4.99 EUR"`) into euro minor units.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed, or if the currency is not `EUR`.
pub fn parse_price(s: &str) -> Result<Price, FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_u64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    if *currency_code != "EUR" {
        return Err(FixtureError::UnsupportedCurrency(
            (*currency_code).to_string(),
        ));
    }

    Ok(Price::from_minor(minor_units))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use testresult::TestResult;

    use super::*;

    const CATALOG: &str = "\
stickers:
  - prompt: astronaut cat eating pizza
    image: https://picsum.photos/400/400?random=1
    price: \"4.99 EUR\"
  - prompt: retro robot with sunglasses
    image: https://picsum.photos/400/400?random=2
    price: \"3.50 EUR\"
";

    #[test]
    fn parse_price_accepts_eur() -> TestResult {
        let price = parse_price("4.99 EUR")?;

        assert_eq!(price.minor_units(), 4_99);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("4.99EUR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_non_euro_currencies() {
        let result = parse_price("4.99 USD");

        assert!(matches!(
            result,
            Err(FixtureError::UnsupportedCurrency(code)) if code == "USD"
        ));
    }

    #[test]
    fn parse_price_rejects_garbage_amount() {
        let result = parse_price("lots EUR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn load_catalog_from_str() -> TestResult {
        let stickers = load_catalog_str(CATALOG)?;

        assert_eq!(stickers.len(), 2);
        assert_eq!(stickers[0].prompt, "astronaut cat eating pizza");
        assert_eq!(stickers[0].unit_price.minor_units(), 4_99);
        assert_eq!(stickers[1].unit_price.minor_units(), 3_50);

        Ok(())
    }

    #[test]
    fn load_catalog_from_path() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(CATALOG.as_bytes())?;

        let stickers = load_catalog_path(file.path())?;

        assert_eq!(stickers.len(), 2);

        Ok(())
    }

    #[test]
    fn load_catalog_rejects_malformed_yaml() {
        let result = load_catalog_str("stickers: [ not closed");

        assert!(matches!(result, Err(FixtureError::Yaml(_))));
    }
}
