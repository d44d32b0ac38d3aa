//! In-process catalog store.
//!
//! Tables are insertion-ordered vectors behind one lock, so listing order is
//! deterministic. Write failures and latency can be injected to exercise the
//! per-item error paths of callers.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use super::{CatalogStore, StoreResult, Upserted};
use crate::domain::aggregates::{
    Attribute, AttributeDraft, AttributeTerm, NewVariant, Product, TermDraft, Variant,
};
use crate::domain::value_objects::{Quantity, Slug};
use crate::StoreError;

#[derive(Default)]
struct Tables {
    attributes: Vec<Attribute>,
    terms: Vec<AttributeTerm>,
    products: Vec<Product>,
    variants: Vec<Variant>,
    failing: HashSet<String>,
}

impl Tables {
    fn check_failure(&self, key: &str) -> StoreResult<()> {
        if self.failing.contains(key) {
            return Err(StoreError::Storage(format!("injected failure for {key}")));
        }
        Ok(())
    }

    fn check_sku(&self, sku: Option<&str>, except_id: Option<&str>) -> StoreResult<()> {
        let Some(sku) = sku else { return Ok(()) };
        let taken = self.variants.iter().any(|v| v.sku.as_deref() == Some(sku) && Some(v.id.as_str()) != except_id);
        if taken { return Err(StoreError::Conflict(format!("sku {sku} already in use"))); }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    latency: Option<Duration>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Delays every trait call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every write whose subject is `key` fail. The subject is the attribute
    /// slug, the term slug, or the variant value.
    pub fn fail_writes_for(&self, key: impl Into<String>) {
        self.tables().failing.insert(key.into());
    }

    /// Number of successful writes issued through the trait.
    pub fn write_count(&self) -> usize { self.writes.load(Ordering::SeqCst) }

    pub fn seed_attribute(&self, name: &str, slug: Slug) -> Attribute {
        let attribute = Attribute { id: new_id(), name: name.to_string(), slug, description: None };
        self.tables().attributes.push(attribute.clone());
        attribute
    }

    pub fn seed_term(&self, attribute_id: &str, name: &str, slug: Slug, image: Option<&str>) -> AttributeTerm {
        let term = AttributeTerm {
            id: new_id(), attribute_id: attribute_id.to_string(), name: name.to_string(), slug,
            image: image.map(str::to_string),
        };
        self.tables().terms.push(term.clone());
        term
    }

    pub fn seed_product(&self, slug: Slug, name: &str, price_ghs: Decimal, stock: Option<Quantity>) -> Product {
        let product = Product { id: new_id(), slug, name: name.to_string(), price_ghs, stock };
        self.tables().products.push(product.clone());
        product
    }

    /// Inserts a variant as-is, without uniqueness or shape checks.
    pub fn seed_variant(&self, product_id: &str, fields: NewVariant) -> Variant {
        let variant = Variant::from_parts(new_id(), product_id.to_string(), fields);
        self.tables().variants.push(variant.clone());
        variant
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency { tokio::time::sleep(latency).await; }
    }

    fn wrote(&self) { self.writes.fetch_add(1, Ordering::SeqCst); }
}

fn new_id() -> String { Uuid::now_v7().to_string() }

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_attributes(&self) -> StoreResult<Vec<Attribute>> {
        self.delay().await;
        Ok(self.tables().attributes.clone())
    }

    async fn list_terms(&self, attribute_id: &str) -> StoreResult<Vec<AttributeTerm>> {
        self.delay().await;
        Ok(self.tables().terms.iter().filter(|t| t.attribute_id == attribute_id).cloned().collect())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.delay().await;
        Ok(self.tables().products.clone())
    }

    async fn list_variants(&self, product_id: &str) -> StoreResult<Vec<Variant>> {
        self.delay().await;
        Ok(self.tables().variants.iter().filter(|v| v.product_id == product_id).cloned().collect())
    }

    async fn find_attribute(&self, slug: &Slug) -> StoreResult<Option<Attribute>> {
        self.delay().await;
        Ok(self.tables().attributes.iter().find(|a| &a.slug == slug).cloned())
    }

    async fn find_term(&self, attribute_id: &str, slug: &Slug) -> StoreResult<Option<AttributeTerm>> {
        self.delay().await;
        Ok(self.tables().terms.iter().find(|t| t.attribute_id == attribute_id && &t.slug == slug).cloned())
    }

    async fn find_product(&self, slug: &Slug) -> StoreResult<Option<Product>> {
        self.delay().await;
        Ok(self.tables().products.iter().find(|p| &p.slug == slug).cloned())
    }

    async fn find_variant(&self, product_id: &str, name: &str, value: &str) -> StoreResult<Option<Variant>> {
        self.delay().await;
        let tables = self.tables();
        Ok(tables.variants.iter().find(|v| v.product_id == product_id && v.name == name && v.value == value).cloned())
    }

    async fn upsert_attribute(&self, draft: &AttributeDraft) -> StoreResult<Upserted<Attribute>> {
        self.delay().await;
        let mut tables = self.tables();
        tables.check_failure(draft.slug.as_str())?;
        let upserted = match tables.attributes.iter_mut().find(|a| a.slug == draft.slug) {
            Some(existing) => {
                existing.name = draft.name.clone();
                existing.description = draft.description.clone();
                Upserted { record: existing.clone(), created: false }
            }
            None => {
                let attribute = Attribute {
                    id: new_id(), name: draft.name.clone(), slug: draft.slug.clone(), description: draft.description.clone(),
                };
                tables.attributes.push(attribute.clone());
                Upserted { record: attribute, created: true }
            }
        };
        self.wrote();
        Ok(upserted)
    }

    async fn upsert_term(&self, attribute_id: &str, draft: &TermDraft) -> StoreResult<Upserted<AttributeTerm>> {
        self.delay().await;
        let mut tables = self.tables();
        tables.check_failure(draft.slug.as_str())?;
        if !tables.attributes.iter().any(|a| a.id == attribute_id) {
            return Err(StoreError::NotFound(format!("attribute {attribute_id}")));
        }
        let upserted = match tables.terms.iter_mut().find(|t| t.attribute_id == attribute_id && t.slug == draft.slug) {
            Some(existing) => {
                existing.name = draft.name.clone();
                if draft.image.is_some() { existing.image = draft.image.clone(); }
                Upserted { record: existing.clone(), created: false }
            }
            None => {
                let term = AttributeTerm {
                    id: new_id(), attribute_id: attribute_id.to_string(), name: draft.name.clone(),
                    slug: draft.slug.clone(), image: draft.image.clone(),
                };
                tables.terms.push(term.clone());
                Upserted { record: term, created: true }
            }
        };
        self.wrote();
        Ok(upserted)
    }

    async fn upsert_variant(&self, product_id: &str, fields: &NewVariant) -> StoreResult<Upserted<Variant>> {
        self.delay().await;
        let mut tables = self.tables();
        tables.check_failure(&fields.value)?;
        let existing_id = tables.variants.iter()
            .find(|v| v.product_id == product_id && v.name == fields.name && v.value == fields.value)
            .map(|v| v.id.clone());
        tables.check_sku(fields.sku.as_deref(), existing_id.as_deref())?;
        let upserted = match existing_id.and_then(|id| tables.variants.iter_mut().find(|v| v.id == id)) {
            Some(existing) => {
                existing.price_ghs = fields.price_ghs;
                existing.compare_at_price_ghs = fields.compare_at_price_ghs;
                existing.stock = fields.stock;
                if fields.sku.is_some() { existing.sku = fields.sku.clone(); }
                if fields.image.is_some() { existing.image = fields.image.clone(); }
                Upserted { record: existing.clone(), created: false }
            }
            None => {
                let variant = Variant::from_parts(new_id(), product_id.to_string(), fields.clone());
                tables.variants.push(variant.clone());
                Upserted { record: variant, created: true }
            }
        };
        self.wrote();
        Ok(upserted)
    }

    async fn create_variant(&self, product_id: &str, fields: &NewVariant) -> StoreResult<Variant> {
        self.delay().await;
        let mut tables = self.tables();
        tables.check_failure(&fields.value)?;
        if tables.variants.iter().any(|v| v.product_id == product_id && v.name == fields.name && v.value == fields.value) {
            return Err(StoreError::Conflict(format!("variant {}={} already exists", fields.name, fields.value)));
        }
        tables.check_sku(fields.sku.as_deref(), None)?;
        let variant = Variant::from_parts(new_id(), product_id.to_string(), fields.clone());
        tables.variants.push(variant.clone());
        self.wrote();
        Ok(variant)
    }

    async fn set_variant_image(&self, variant_id: &str, image: &str) -> StoreResult<Variant> {
        self.delay().await;
        let mut tables = self.tables();
        let idx = tables.variants.iter().position(|v| v.id == variant_id)
            .ok_or_else(|| StoreError::NotFound(format!("variant {variant_id}")))?;
        tables.check_failure(&tables.variants[idx].value)?;
        tables.variants[idx].image = Some(image.to_string());
        self.wrote();
        Ok(tables.variants[idx].clone())
    }
}
