//! Cross-environment catalog reconciliation.
//!
//! Local and production databases share no primary keys, so every record is
//! matched by its natural key: attributes by slug, terms by (attribute slug,
//! term slug), variants by (product slug, name, value). Each run is a full,
//! independent pass; running it again without source changes writes nothing.

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::matcher::TermImageIndex;
use super::normalizer::normalize;
use super::report::{PhaseReport, SyncReport};
use super::timed;
use crate::domain::aggregates::{Attribute, AttributeDraft, AttributeTerm, Product, TermDraft, Variant};
use crate::domain::events::{ItemOutcome, NaturalKey};
use crate::domain::value_objects::{normalize_swatch_path, Slug};
use crate::store::{CatalogStore, StoreResult};
use crate::{CatalogError, Result, StoreError};

/// Entity types a run reconciles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SyncScope {
    pub attributes: bool,
    pub terms: bool,
    pub variants: bool,
}

impl SyncScope {
    pub fn all() -> Self { Self { attributes: true, terms: true, variants: true } }
}

impl Default for SyncScope {
    fn default() -> Self { Self::all() }
}

impl FromStr for SyncScope {
    type Err = CatalogError;

    /// Parses a comma separated list such as `"attributes,terms"` or `"all"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut scope = Self { attributes: false, terms: false, variants: false };
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "all" => scope = Self::all(),
                "attributes" => scope.attributes = true,
                "terms" => scope.terms = true,
                "variants" => scope.variants = true,
                other => return Err(CatalogError::InvalidScope(other.to_string())),
            }
        }
        if !(scope.attributes || scope.terms || scope.variants) {
            return Err(CatalogError::InvalidScope(s.to_string()));
        }
        Ok(scope)
    }
}

#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// Upper bound for every single store call.
    pub store_timeout: Duration,
    /// Attribute whose target terms supply derived variant images.
    pub image_attribute: Slug,
}

impl SyncOptions {
    pub fn new(store_timeout: Duration, image_attribute: Slug) -> Self { Self { store_timeout, image_attribute } }
}

/// Target ids learned during a run and handed from one phase to the next.
#[derive(Default)]
struct RunState {
    attribute_ids: HashMap<Slug, Option<String>>,
    products: HashMap<Slug, Option<Product>>,
}

pub struct Synchronizer {
    source: Arc<dyn CatalogStore>,
    target: Arc<dyn CatalogStore>,
    options: SyncOptions,
}

impl Synchronizer {
    pub fn new(source: Arc<dyn CatalogStore>, target: Arc<dyn CatalogStore>, options: SyncOptions) -> Self {
        Self { source, target, options }
    }

    /// Reconciles `scope` from source into target, attributes first, then terms, then variants.
    ///
    /// Per-item failures land in the report. Only failing to enumerate the source
    /// returns an error. When `cancel` fires, the run stops before the next item
    /// and returns what it has so far with `cancelled` set.
    pub async fn sync(&self, scope: SyncScope, cancel: &CancellationToken) -> Result<SyncReport> {
        let mut report = SyncReport::start();
        let mut run = RunState::default();
        info!(?scope, "catalog sync started");

        let attributes = if scope.attributes || scope.terms {
            self.enumerate("attributes", self.source.list_attributes()).await?
        } else {
            Vec::new()
        };

        if scope.attributes && !self.sync_attributes(&attributes, &mut run, &mut report.attributes, cancel).await {
            return Ok(Self::cancelled(report));
        }

        if scope.terms {
            let mut source_terms = Vec::with_capacity(attributes.len());
            for attribute in &attributes {
                let terms = self.enumerate("terms", self.source.list_terms(&attribute.id)).await?;
                source_terms.push((attribute, terms));
            }
            if !self.sync_terms(&source_terms, &mut run, &mut report.terms, cancel).await {
                return Ok(Self::cancelled(report));
            }
        }

        if scope.variants {
            let mut source_variants = Vec::new();
            for product in self.enumerate("products", self.source.list_products()).await? {
                let variants = self.enumerate("variants", self.source.list_variants(&product.id)).await?;
                if !variants.is_empty() { source_variants.push((product, variants)); }
            }
            let index = self.target_swatch_index().await;
            if !self.sync_variants(&source_variants, &index, &mut run, &mut report.variants, cancel).await {
                return Ok(Self::cancelled(report));
            }
        }

        let report = report.finish();
        info!(
            created = report.created(), updated = report.updated(), skipped = report.skipped(),
            errors = report.error_count(), conflicts_avoided = report.conflicts_avoided(), "catalog sync finished"
        );
        Ok(report)
    }

    async fn enumerate<T>(&self, entity: &'static str, call: impl Future<Output = StoreResult<T>>) -> Result<T> {
        timed(self.options.store_timeout, call).await.map_err(|source| {
            warn!(entity, error = %source, "cannot enumerate source");
            CatalogError::Enumeration { entity, source }
        })
    }

    fn cancelled(mut report: SyncReport) -> SyncReport {
        warn!("catalog sync cancelled");
        report.cancelled = true;
        report.finish()
    }

    fn failed(key: &NaturalKey, err: StoreError) -> ItemOutcome {
        warn!(%key, error = %err, "sync item failed");
        ItemOutcome::Failed { reason: err.to_string() }
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    async fn sync_attributes(&self, attributes: &[Attribute], run: &mut RunState, phase: &mut PhaseReport, cancel: &CancellationToken) -> bool {
        info!(count = attributes.len(), "syncing attributes");
        for attribute in attributes {
            if cancel.is_cancelled() { return false; }
            let key = NaturalKey::Attribute { slug: attribute.slug.clone() };
            let outcome = self.sync_attribute(attribute, &key, run, phase).await.unwrap_or_else(|e| Self::failed(&key, e));
            debug!(%key, ?outcome, "attribute synced");
            phase.record(key, outcome);
        }
        true
    }

    async fn sync_attribute(&self, source: &Attribute, key: &NaturalKey, run: &mut RunState, phase: &mut PhaseReport) -> StoreResult<ItemOutcome> {
        let limit = self.options.store_timeout;
        let existing = timed(limit, self.target.find_attribute(&source.slug)).await?;
        let mut draft = AttributeDraft::from(source);

        if let Some(existing) = &existing {
            if draft.description.is_none() && existing.description.is_some() {
                phase.record(key.clone(), ItemOutcome::ConflictAvoided { field: "description" });
                draft.description = existing.description.clone();
            }
            if existing.name == draft.name && existing.description == draft.description {
                run.attribute_ids.insert(source.slug.clone(), Some(existing.id.clone()));
                return Ok(ItemOutcome::Unchanged);
            }
        }

        let upserted = timed(limit, self.target.upsert_attribute(&draft)).await?;
        run.attribute_ids.insert(source.slug.clone(), Some(upserted.record.id));
        Ok(if upserted.created { ItemOutcome::Created } else { ItemOutcome::Updated })
    }

    async fn target_attribute_id(&self, slug: &Slug, run: &mut RunState) -> StoreResult<Option<String>> {
        if let Some(id) = run.attribute_ids.get(slug) { return Ok(id.clone()); }
        let id = timed(self.options.store_timeout, self.target.find_attribute(slug)).await?.map(|a| a.id);
        run.attribute_ids.insert(slug.clone(), id.clone());
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Terms
    // -------------------------------------------------------------------------

    async fn sync_terms(
        &self,
        source_terms: &[(&Attribute, Vec<AttributeTerm>)],
        run: &mut RunState,
        phase: &mut PhaseReport,
        cancel: &CancellationToken,
    ) -> bool {
        info!(count = source_terms.iter().map(|(_, t)| t.len()).sum::<usize>(), "syncing attribute terms");
        for (attribute, terms) in source_terms {
            for term in terms {
                if cancel.is_cancelled() { return false; }
                let key = NaturalKey::Term { attribute_slug: attribute.slug.clone(), term_slug: term.slug.clone() };
                let outcome = self.sync_term(attribute, term, &key, run, phase).await.unwrap_or_else(|e| Self::failed(&key, e));
                debug!(%key, ?outcome, "term synced");
                phase.record(key, outcome);
            }
        }
        true
    }

    async fn sync_term(
        &self,
        attribute: &Attribute,
        source: &AttributeTerm,
        key: &NaturalKey,
        run: &mut RunState,
        phase: &mut PhaseReport,
    ) -> StoreResult<ItemOutcome> {
        let Some(attribute_id) = self.target_attribute_id(&attribute.slug, run).await? else {
            return Ok(ItemOutcome::NotFound { missing: format!("attribute {}", attribute.slug) });
        };
        let limit = self.options.store_timeout;
        let existing = timed(limit, self.target.find_term(&attribute_id, &source.slug)).await?;
        let mut draft = TermDraft {
            name: source.name.clone(),
            slug: source.slug.clone(),
            image: source.image.as_deref().and_then(normalize_swatch_path),
        };

        if let Some(existing) = &existing {
            if draft.image.is_none() && existing.image.is_some() {
                phase.record(key.clone(), ItemOutcome::ConflictAvoided { field: "image" });
                draft.image = existing.image.clone();
            }
            if existing.name == draft.name && existing.image == draft.image {
                return Ok(ItemOutcome::Unchanged);
            }
        }

        let upserted = timed(limit, self.target.upsert_term(&attribute_id, &draft)).await?;
        Ok(if upserted.created { ItemOutcome::Created } else { ItemOutcome::Updated })
    }

    // -------------------------------------------------------------------------
    // Variants
    // -------------------------------------------------------------------------

    /// Swatch index over the target's image attribute, used to derive missing variant images.
    async fn target_swatch_index(&self) -> TermImageIndex {
        let slug = &self.options.image_attribute;
        match timed(self.options.store_timeout, self.target.load_attribute(slug)).await {
            Ok(Some(attribute)) => TermImageIndex::from_terms(&attribute.terms),
            Ok(None) => {
                debug!(attribute = %slug, "image attribute absent in target");
                TermImageIndex::new()
            }
            Err(e) => {
                warn!(attribute = %slug, error = %e, "cannot load target swatches, variant images will not be derived");
                TermImageIndex::new()
            }
        }
    }

    async fn target_product(&self, slug: &Slug, run: &mut RunState) -> StoreResult<Option<Product>> {
        if let Some(product) = run.products.get(slug) { return Ok(product.clone()); }
        let product = timed(self.options.store_timeout, self.target.find_product(slug)).await?;
        run.products.insert(slug.clone(), product.clone());
        Ok(product)
    }

    async fn sync_variants(
        &self,
        source_variants: &[(Product, Vec<Variant>)],
        index: &TermImageIndex,
        run: &mut RunState,
        phase: &mut PhaseReport,
        cancel: &CancellationToken,
    ) -> bool {
        info!(count = source_variants.iter().map(|(_, v)| v.len()).sum::<usize>(), "syncing variants");
        for (product, variants) in source_variants {
            for variant in variants {
                if cancel.is_cancelled() { return false; }
                let key = NaturalKey::Variant {
                    product_slug: product.slug.clone(), name: variant.name.clone(), value: variant.value.clone(),
                };
                let outcome = self.sync_variant(product, variant, index, &key, run, phase).await
                    .unwrap_or_else(|e| Self::failed(&key, e));
                debug!(%key, ?outcome, "variant synced");
                phase.record(key, outcome);
            }
        }
        true
    }

    async fn sync_variant(
        &self,
        product: &Product,
        source: &Variant,
        index: &TermImageIndex,
        key: &NaturalKey,
        run: &mut RunState,
        phase: &mut PhaseReport,
    ) -> StoreResult<ItemOutcome> {
        let Some(target_product) = self.target_product(&product.slug, run).await? else {
            return Ok(ItemOutcome::NotFound { missing: format!("product {}", product.slug) });
        };
        let limit = self.options.store_timeout;
        let existing = timed(limit, self.target.find_variant(&target_product.id, &source.name, &source.value)).await?;

        let mut desired = source.clone();
        desired.id = existing.as_ref().map(|e| e.id.clone()).unwrap_or_default();
        desired.product_id = target_product.id.clone();
        desired.image = source.image.as_deref().and_then(normalize_swatch_path);
        if let Some(existing) = &existing {
            if desired.image.is_none() && existing.image.is_some() {
                phase.record(key.clone(), ItemOutcome::ConflictAvoided { field: "image" });
                desired.image = existing.image.clone();
            }
            if desired.sku.is_none() && existing.sku.is_some() {
                phase.record(key.clone(), ItemOutcome::ConflictAvoided { field: "sku" });
                desired.sku = existing.sku.clone();
            }
        }

        let mut normalized = normalize(&target_product, [desired], index, &self.options.image_attribute);
        if let Some(flagged) = normalized.invalid.first() {
            return Ok(ItemOutcome::Failed { reason: format!("malformed variant: {:?}", flagged.issue) });
        }
        if !normalized.sale_price_conflicts.is_empty() {
            warn!(%key, "sale price not below price, syncing without it");
        }
        let Some(desired) = normalized.valid.pop() else {
            return Ok(ItemOutcome::Failed { reason: "variant rejected by normalizer".to_string() });
        };

        if existing.as_ref().is_some_and(|e| same_sellable_fields(e, &desired)) {
            return Ok(ItemOutcome::Unchanged);
        }
        let upserted = timed(limit, self.target.upsert_variant(&target_product.id, &desired.to_new())).await?;
        Ok(if upserted.created { ItemOutcome::Created } else { ItemOutcome::Updated })
    }
}

fn same_sellable_fields(a: &Variant, b: &Variant) -> bool {
    a.price_ghs == b.price_ghs
        && a.compare_at_price_ghs == b.compare_at_price_ghs
        && a.stock == b.stock
        && a.sku == b.sku
        && a.image == b.image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::NewVariant;
    use crate::domain::services::combinator::{generate_variants, GenerationOptions};
    use crate::domain::value_objects::Quantity;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    fn slug(s: &str) -> Slug { Slug::new(s).unwrap() }

    fn options() -> SyncOptions { SyncOptions::new(Duration::from_secs(1), slug("color")) }

    struct Fixture {
        source: Arc<MemoryStore>,
        target: Arc<MemoryStore>,
        source_wig: Product,
    }

    impl Fixture {
        fn synchronizer(&self, options: SyncOptions) -> Synchronizer {
            Synchronizer::new(self.source.clone(), self.target.clone(), options)
        }

        async fn run(&self) -> SyncReport {
            self.synchronizer(options()).sync(SyncScope::all(), &CancellationToken::new()).await.unwrap()
        }
    }

    /// Source: Color [Black (remote image), Blonde], Length [12in, 16in], 4 generated
    /// variants on "body-wave" and one variant on "closure", which the target lacks.
    async fn fixture(target: MemoryStore) -> Fixture {
        let source = Arc::new(MemoryStore::new());
        let color = source.seed_attribute("Color", slug("color"));
        source.seed_term(&color.id, "Black", slug("black"), Some("https://local.test/uploads/black.png"));
        source.seed_term(&color.id, "Blonde", slug("blonde"), None);
        let length = source.seed_attribute("Length", slug("length"));
        source.seed_term(&length.id, "12in", slug("12in"), None);
        source.seed_term(&length.id, "16in", slug("16in"), None);

        let price = Decimal::new(1200, 0);
        let source_wig = source.seed_product(slug("body-wave"), "Body Wave", price, Some(Quantity::new(5)));
        target.seed_product(slug("body-wave"), "Body Wave", price, Some(Quantity::new(5)));
        let closure = source.seed_product(slug("closure"), "Closure", price, None);

        let attributes = vec![
            source.load_attribute(&slug("color")).await.unwrap().unwrap(),
            source.load_attribute(&slug("length")).await.unwrap().unwrap(),
        ];
        generate_variants(&*source, &source_wig, &attributes, &GenerationOptions::default()).await.unwrap();
        source.seed_variant(&closure.id, NewVariant {
            name: "Color".into(), value: "Black".into(), image: None, price_ghs: None,
            compare_at_price_ghs: None, stock: Quantity::new(1), sku: None,
        });

        Fixture { source, target: Arc::new(target), source_wig }
    }

    async fn target_variants(f: &Fixture) -> Vec<Variant> {
        let product = f.target.find_product(&slug("body-wave")).await.unwrap().unwrap();
        f.target.list_variants(&product.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_run_creates_everything() {
        let f = fixture(MemoryStore::new()).await;
        let report = f.run().await;

        assert_eq!((report.attributes.created, report.terms.created, report.variants.created), (2, 4, 4));
        assert_eq!(report.variants.skipped, 1);
        assert_eq!(report.variants.not_found, vec![NaturalKey::Variant {
            product_slug: slug("closure"), name: "Color".into(), value: "Black".into(),
        }]);
        assert_eq!(report.error_count(), 0);
        assert!(!report.cancelled);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let f = fixture(MemoryStore::new()).await;
        f.run().await;
        let writes = f.target.write_count();

        let again = f.run().await;
        assert_eq!(again.created(), 0);
        assert_eq!(again.updated(), 0);
        assert!(again.is_noop());
        assert_eq!(again.skipped(), 2 + 4 + 5);
        assert_eq!(f.target.write_count(), writes);
    }

    #[tokio::test]
    async fn test_image_paths_rewritten_on_transfer() {
        let f = fixture(MemoryStore::new()).await;
        f.run().await;

        let color = f.target.load_attribute(&slug("color")).await.unwrap().unwrap();
        assert_eq!(color.terms[0].image.as_deref(), Some("/media/swatches/black.png"));
        let variants = target_variants(&f).await;
        assert_eq!(variants[0].value, "Black / 12in");
        assert_eq!(variants[0].image.as_deref(), Some("/media/swatches/black.png"));
        assert_eq!(variants[2].image, None);
    }

    #[tokio::test]
    async fn test_null_source_image_never_clobbers_target() {
        let target = MemoryStore::new();
        let color = target.seed_attribute("Color", slug("color"));
        target.seed_term(&color.id, "Blonde", slug("blonde"), Some("/media/swatches/blonde-prod.png"));
        let f = fixture(target).await;

        let report = f.run().await;
        let blonde = f.target.find_term(&color.id, &slug("blonde")).await.unwrap().unwrap();
        assert_eq!(blonde.image.as_deref(), Some("/media/swatches/blonde-prod.png"));
        assert_eq!(report.attributes.skipped, 1);
        assert_eq!(report.terms.skipped, 1);
        assert!(report.terms.conflicts_avoided >= 1);

        // Blonde variants pick the production swatch up through the matcher.
        let variants = target_variants(&f).await;
        assert_eq!(variants[2].value, "Blonde / 12in");
        assert_eq!(variants[2].image.as_deref(), Some("/media/swatches/blonde-prod.png"));

        assert!(f.run().await.is_noop());
    }

    #[tokio::test]
    async fn test_changed_source_variant_is_updated() {
        let f = fixture(MemoryStore::new()).await;
        f.run().await;

        let mut fields = f.source.list_variants(&f.source_wig.id).await.unwrap()[1].to_new();
        fields.stock = Quantity::new(0);
        fields.compare_at_price_ghs = Some(Decimal::new(999, 0));
        f.source.upsert_variant(&f.source_wig.id, &fields).await.unwrap();

        let report = f.run().await;
        assert_eq!((report.variants.created, report.variants.updated), (0, 1));
        let synced = &target_variants(&f).await[1];
        assert!(synced.is_out_of_stock());
        assert_eq!(synced.compare_at_price_ghs, Some(Decimal::new(999, 0)));
    }

    #[tokio::test]
    async fn test_item_failure_does_not_abort_batch() {
        let target = MemoryStore::new();
        target.fail_writes_for("black");
        let f = fixture(target).await;

        let report = f.run().await;
        assert_eq!(report.terms.created, 3);
        assert_eq!(report.terms.errors.len(), 1);
        assert_eq!(report.terms.errors[0].key, NaturalKey::Term { attribute_slug: slug("color"), term_slug: slug("black") });
        assert_eq!(report.variants.created, 4);
    }

    #[tokio::test]
    async fn test_timeouts_are_item_errors() {
        let f = fixture(MemoryStore::new().with_latency(Duration::from_millis(50))).await;
        let options = SyncOptions::new(Duration::from_millis(5), slug("color"));

        let report = f.synchronizer(options).sync(SyncScope::all(), &CancellationToken::new()).await.unwrap();
        assert_eq!(report.error_count(), 2 + 4 + 5);
        assert!(report.attributes.errors.iter().all(|e| e.reason.contains("timed out")));
        assert_eq!(report.created(), 0);
    }

    #[tokio::test]
    async fn test_source_enumeration_failure_is_fatal() {
        let f = fixture(MemoryStore::new()).await;
        let slow_source = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(50)));
        let sync = Synchronizer::new(slow_source, f.target.clone(), SyncOptions::new(Duration::from_millis(5), slug("color")));

        let err = sync.sync(SyncScope::all(), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Enumeration { entity: "attributes", source: StoreError::Timeout(_) }));
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_report() {
        let f = fixture(MemoryStore::new()).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = f.synchronizer(options()).sync(SyncScope::all(), &cancel).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.attributes.processed(), 0);
        assert_eq!(f.target.write_count(), 0);
    }

    #[tokio::test]
    async fn test_terms_without_target_attribute_are_skipped() {
        let f = fixture(MemoryStore::new()).await;
        let scope = SyncScope { attributes: false, terms: true, variants: false };

        let report = f.synchronizer(options()).sync(scope, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.terms.skipped, 4);
        assert_eq!(report.terms.not_found.len(), 4);
        assert_eq!(f.target.write_count(), 0);
    }

    #[tokio::test]
    async fn test_renamed_attribute_is_updated() {
        let f = fixture(MemoryStore::new()).await;
        f.run().await;

        let draft = AttributeDraft { name: "Hair Color".into(), slug: slug("color"), description: Some("Swatch shade".into()) };
        f.source.upsert_attribute(&draft).await.unwrap();

        let report = f.run().await;
        assert_eq!((report.attributes.created, report.attributes.updated, report.attributes.skipped), (0, 1, 1));
        let synced = f.target.find_attribute(&slug("color")).await.unwrap().unwrap();
        assert_eq!(synced.name, "Hair Color");
        assert_eq!(synced.description.as_deref(), Some("Swatch shade"));
        assert!(f.run().await.is_noop());
    }

    #[tokio::test]
    async fn test_changed_term_overwrites_target_with_normalized_image() {
        let target = MemoryStore::new();
        let color = target.seed_attribute("Color", slug("color"));
        target.seed_term(&color.id, "Blonde", slug("blonde"), Some("/media/swatches/blonde-prod.png"));
        let f = fixture(target).await;

        let source_color = f.source.find_attribute(&slug("color")).await.unwrap().unwrap();
        let draft = TermDraft {
            name: "Honey Blonde".into(), slug: slug("blonde"), image: Some("https://local.test/uploads/2024/honey.png".into()),
        };
        f.source.upsert_term(&source_color.id, &draft).await.unwrap();

        let report = f.run().await;
        assert_eq!((report.terms.created, report.terms.updated), (3, 1));
        assert_eq!(report.terms.conflicts_avoided, 0);
        let blonde = f.target.find_term(&color.id, &slug("blonde")).await.unwrap().unwrap();
        assert_eq!(blonde.name, "Honey Blonde");
        assert_eq!(blonde.image.as_deref(), Some("/media/swatches/honey.png"));
    }

    #[tokio::test]
    async fn test_images_derived_from_configured_attribute() {
        let source = Arc::new(MemoryStore::new());
        let target = Arc::new(MemoryStore::new());
        let finish = target.seed_attribute("Finish", slug("finish"));
        target.seed_term(&finish.id, "Matte", slug("matte"), Some("/media/swatches/matte.png"));
        target.seed_term(&finish.id, "Black", slug("black"), Some("/media/swatches/finish-black.png"));

        let price = Decimal::new(500, 0);
        let product = source.seed_product(slug("bob"), "Bob", price, None);
        let target_product = target.seed_product(slug("bob"), "Bob", price, None);
        for (name, value) in [("Finish", "Matte"), ("Color", "Black")] {
            source.seed_variant(&product.id, NewVariant {
                name: name.into(), value: value.into(), image: None, price_ghs: None,
                compare_at_price_ghs: None, stock: Quantity::new(1), sku: None,
            });
        }

        let scope = SyncScope { attributes: false, terms: false, variants: true };
        let options = SyncOptions::new(Duration::from_secs(1), slug("finish"));
        let report = Synchronizer::new(source, target.clone(), options).sync(scope, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.variants.created, 2);

        let synced = target.list_variants(&target_product.id).await.unwrap();
        assert_eq!((synced[0].value.as_str(), synced[0].image.as_deref()), ("Matte", Some("/media/swatches/matte.png")));
        assert_eq!((synced[1].value.as_str(), synced[1].image.as_deref()), ("Black", None));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("all".parse::<SyncScope>().unwrap(), SyncScope::all());
        assert_eq!(
            " attributes , terms ".parse::<SyncScope>().unwrap(),
            SyncScope { attributes: true, terms: true, variants: false }
        );
        assert!("".parse::<SyncScope>().is_err());
        assert!(matches!("products".parse::<SyncScope>(), Err(CatalogError::InvalidScope(s)) if s == "products"));
    }
}
