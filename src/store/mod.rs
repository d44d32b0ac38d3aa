//! Record store seam.
//!
//! Every component receives its store handle explicitly, so a sync run can hold
//! a local and a production handle side by side.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::Serialize;
use crate::domain::aggregates::{
    Attribute, AttributeDraft, AttributeTerm, AttributeWithTerms, NewVariant, Product, TermDraft, Variant,
};
use crate::domain::value_objects::Slug;
use crate::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result of an atomic insert-or-update keyed by a natural key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Upserted<T> {
    pub record: T,
    pub created: bool,
}

/// Catalog record store reachable by natural keys.
///
/// Upserts must be atomic with respect to the natural key (a unique constraint, not
/// a read followed by a write), and `upsert_term` must keep a stored image when the
/// draft carries none.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_attributes(&self) -> StoreResult<Vec<Attribute>>;
    async fn list_terms(&self, attribute_id: &str) -> StoreResult<Vec<AttributeTerm>>;
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn list_variants(&self, product_id: &str) -> StoreResult<Vec<Variant>>;

    async fn find_attribute(&self, slug: &Slug) -> StoreResult<Option<Attribute>>;
    async fn find_term(&self, attribute_id: &str, slug: &Slug) -> StoreResult<Option<AttributeTerm>>;
    async fn find_product(&self, slug: &Slug) -> StoreResult<Option<Product>>;
    async fn find_variant(&self, product_id: &str, name: &str, value: &str) -> StoreResult<Option<Variant>>;

    async fn upsert_attribute(&self, draft: &AttributeDraft) -> StoreResult<Upserted<Attribute>>;
    async fn upsert_term(&self, attribute_id: &str, draft: &TermDraft) -> StoreResult<Upserted<AttributeTerm>>;
    async fn upsert_variant(&self, product_id: &str, fields: &NewVariant) -> StoreResult<Upserted<Variant>>;

    /// Plain insert; fails with [`StoreError::Conflict`] if (product, name, value) exists.
    async fn create_variant(&self, product_id: &str, fields: &NewVariant) -> StoreResult<Variant>;
    async fn set_variant_image(&self, variant_id: &str, image: &str) -> StoreResult<Variant>;

    /// Loads an attribute and its terms, or `None` if the slug is unknown.
    async fn load_attribute(&self, slug: &Slug) -> StoreResult<Option<AttributeWithTerms>> {
        let Some(attribute) = self.find_attribute(slug).await? else { return Ok(None) };
        let terms = self.list_terms(&attribute.id).await?;
        Ok(Some(AttributeWithTerms::new(attribute, terms)))
    }
}
