//! Product reference
//!
//! Products are owned by the storefront catalog; this engine only reads the
//! fields that seed variant defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Quantity, Slug};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub slug: Slug,
    pub name: String,
    pub price_ghs: Decimal,
    pub stock: Option<Quantity>,
}

impl Product {
    pub fn default_stock(&self) -> Quantity { self.stock.unwrap_or_default() }
}
