//! Value Objects for the catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public prefix the static-file server uses for swatch assets.
pub const SWATCH_PREFIX: &str = "/media/swatches/";

/// Slug value object: the natural key of attributes, terms and products.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into().trim().to_lowercase();
        if value.is_empty() { return Err(SlugError::Empty); }
        if let Some(c) = value.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_')) {
            return Err(SlugError::InvalidChar(c));
        }
        Ok(Self(value))
    }

    /// Derives a slug from a display name: "Honey Blonde" -> "honey-blonde".
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        for c in name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        }
        Self::new(out.trim_end_matches('-'))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self { slug.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SlugError { Empty, InvalidChar(char) }
impl std::error::Error for SlugError {}
impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "slug empty"), Self::InvalidChar(c) => write!(f, "slug contains {c:?}") }
    }
}

/// Stock quantity value object. Negative stock is unrepresentable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self).map_err(|_| QuantityError::Negative(value))
    }
}

impl TryFrom<Quantity> for i32 {
    type Error = QuantityError;
    fn try_from(q: Quantity) -> Result<Self, Self::Error> { i32::try_from(q.0).map_err(|_| QuantityError::TooLarge(q.0)) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { Negative(i32), TooLarge(u32) }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative(v) => write!(f, "negative stock {v}"),
            Self::TooLarge(v) => write!(f, "stock {v} exceeds the storable maximum"),
        }
    }
}

/// A compare-at (sale) price of zero or less means "no sale".
pub fn normalize_compare_at(price: Option<Decimal>) -> Option<Decimal> {
    price.filter(|p| *p > Decimal::ZERO)
}

/// Rewrites a swatch image reference to the portable `/media/swatches/<basename>` form.
///
/// Host-qualified URLs and local file paths both reduce to their basename, since each
/// environment serves the swatch directory from its own host. Query strings and fragments
/// are dropped. Returns `None` when no basename can be extracted.
pub fn normalize_swatch_path(image: &str) -> Option<String> {
    let image = image.trim();
    let without_scheme = image
        .strip_prefix("https://")
        .or_else(|| image.strip_prefix("http://"))
        .map(|rest| rest.split_once('/').map_or("", |(_, path)| path))
        .unwrap_or(image);
    let path = without_scheme.split(['?', '#']).next().unwrap_or_default();
    let basename = path.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if basename.is_empty() { return None; }
    Some(format!("{SWATCH_PREFIX}{basename}"))
}
