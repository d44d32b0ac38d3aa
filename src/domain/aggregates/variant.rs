//! Variant Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::value_objects::{Quantity, Slug};
use crate::CatalogError;

/// One purchasable combination of term selections for a product.
///
/// Fields are public because variants are read back from stores as-is,
/// malformed ones included; [`Variant::new`] is the validated constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub value: String,
    pub image: Option<String>,
    pub price_ghs: Option<Decimal>,
    pub compare_at_price_ghs: Option<Decimal>,
    pub stock: Quantity,
    pub sku: Option<String>,
}

/// Fields of a variant before it has an identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_variant"))]
pub struct NewVariant {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub value: String,
    pub image: Option<String>,
    pub price_ghs: Option<Decimal>,
    pub compare_at_price_ghs: Option<Decimal>,
    pub stock: Quantity,
    pub sku: Option<String>,
}

fn validate_new_variant(v: &NewVariant) -> Result<(), ValidationError> {
    if v.name.trim().is_empty() || v.value.trim().is_empty() {
        return Err(ValidationError::new("blank_name_or_value"));
    }
    if let (Some(price), Some(sale)) = (v.price_ghs, v.compare_at_price_ghs) {
        if sale >= price { return Err(ValidationError::new("sale_price_not_below_price")); }
    }
    Ok(())
}

impl Variant {
    pub fn new(id: impl Into<String>, product_id: impl Into<String>, fields: NewVariant) -> Result<Self, CatalogError> {
        fields.validate()?;
        Ok(Self::from_parts(id.into(), product_id.into(), fields))
    }

    pub(crate) fn from_parts(id: String, product_id: String, f: NewVariant) -> Self {
        Self {
            id, product_id, name: f.name, value: f.value, image: f.image, price_ghs: f.price_ghs,
            compare_at_price_ghs: f.compare_at_price_ghs, stock: f.stock, sku: f.sku,
        }
    }

    pub fn is_structurally_valid(&self) -> bool { self.structural_issue().is_none() }

    pub fn structural_issue(&self) -> Option<StructuralIssue> {
        match (self.name.trim().is_empty(), self.value.trim().is_empty()) {
            (false, false) => None,
            (true, false) => Some(StructuralIssue::MissingName),
            (false, true) => Some(StructuralIssue::MissingValue),
            (true, true) => Some(StructuralIssue::MissingNameAndValue),
        }
    }

    pub fn is_out_of_stock(&self) -> bool { self.stock.is_zero() }

    pub fn effective_price(&self, base_price: Decimal) -> Decimal { self.price_ghs.unwrap_or(base_price) }

    /// Position of `axis` among the " / " separated axis names ("Color / Length" has color at 0).
    pub fn axis_position(&self, axis: &Slug) -> Option<usize> {
        self.name
            .split('/')
            .position(|part| Slug::from_name(part).is_ok_and(|slug| slug.as_str().contains(axis.as_str())))
    }

    pub fn mentions_axis(&self, axis: &Slug) -> bool { self.axis_position(axis).is_some() }

    /// The value selected on `axis`: "Black" for "Color / Length" = "Black / 12in".
    /// Falls back to the whole value when names and values do not line up.
    pub fn axis_value(&self, axis: &Slug) -> Option<&str> {
        let position = self.axis_position(axis)?;
        let values: Vec<&str> = self.value.split('/').map(str::trim).collect();
        if values.len() == self.name.split('/').count() { values.get(position).copied() } else { Some(self.value.trim()) }
    }

    pub fn to_ref(&self, issue: StructuralIssue) -> VariantRef {
        VariantRef { id: self.id.clone(), product_id: self.product_id.clone(), issue }
    }

    pub fn to_new(&self) -> NewVariant {
        NewVariant {
            name: self.name.clone(), value: self.value.clone(), image: self.image.clone(),
            price_ghs: self.price_ghs, compare_at_price_ghs: self.compare_at_price_ghs,
            stock: self.stock, sku: self.sku.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralIssue { MissingName, MissingValue, MissingNameAndValue, SalePriceNotBelowPrice }

/// Pointer to a variant flagged by the normalizer. The record itself is left in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRef {
    pub id: String,
    pub product_id: String,
    pub issue: StructuralIssue,
}
