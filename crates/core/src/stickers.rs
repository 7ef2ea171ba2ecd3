//! Stickers

use std::fmt;

use uuid::Uuid;

use crate::pricing::Price;

/// Default storefront price for a generated sticker (€4.99).
pub const DEFAULT_STICKER_PRICE: Price = Price::from_minor(4_99);

/// Opaque unique sticker identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StickerId(Uuid);

impl StickerId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for StickerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a sticker's artwork lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An opaque URI, e.g. catalog artwork served elsewhere.
    Uri(String),
    /// Inline PNG bytes produced by the image model.
    Png(Vec<u8>),
}

/// A purchasable sticker artifact.
///
/// Immutable once created. Editing never mutates a sticker in place: the
/// controller's working image is replaced wholesale before cart insertion,
/// so stickers already in a cart are unaffected by later edits.
#[derive(Debug, Clone, PartialEq)]
pub struct Sticker {
    /// Unique identifier.
    pub id: StickerId,
    /// Artwork reference.
    pub image: ImageSource,
    /// Prompt the artwork was generated from.
    pub prompt: String,
    /// Unit price in euro minor units.
    pub unit_price: Price,
}

impl Sticker {
    /// Create a sticker with the given price.
    #[must_use]
    pub fn new(image: ImageSource, prompt: impl Into<String>, unit_price: Price) -> Self {
        Self {
            id: StickerId::new(),
            image,
            prompt: prompt.into(),
            unit_price,
        }
    }

    /// Create a sticker at the default storefront price.
    #[must_use]
    pub fn priced_default(image: ImageSource, prompt: impl Into<String>) -> Self {
        Self::new(image, prompt, DEFAULT_STICKER_PRICE)
    }
}

/// Derive a default display name from a prompt: the first 20 characters,
/// with anything outside `[a-z0-9]` mapped to `_`, lowercased.
#[must_use]
pub fn derive_name(prompt: &str) -> String {
    prompt
        .chars()
        .take(20)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
