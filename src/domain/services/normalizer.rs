//! Variant shape checks and swatch image backfill.

use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::matcher::{resolve_image, TermImageIndex};
use super::report::ItemFailure;
use super::timed;
use crate::domain::aggregates::{Product, StructuralIssue, Variant, VariantRef};
use crate::domain::events::NaturalKey;
use crate::domain::value_objects::{normalize_compare_at, Slug};
use crate::store::CatalogStore;
use crate::Result;

#[derive(Clone, Debug, Default, Serialize)]
pub struct NormalizationReport {
    pub valid: Vec<Variant>,
    /// Variants missing a name or value. They stay in the store untouched.
    pub invalid: Vec<VariantRef>,
    pub backfilled: usize,
    /// Valid variants whose sale price was not below their price; emitted without it.
    pub sale_price_conflicts: Vec<VariantRef>,
}

/// Splits valid from malformed variants and fills missing images on the `image_axis`
/// (the image-bearing attribute, "color" by default) from `index`.
///
/// Prices and stock are never invented. A compare-at price of zero or less is read as
/// "no sale"; one at or above the effective price is dropped from the emitted variant.
pub fn normalize(
    product: &Product,
    variants: impl IntoIterator<Item = Variant>,
    index: &TermImageIndex,
    image_axis: &Slug,
) -> NormalizationReport {
    let mut report = NormalizationReport::default();
    for mut variant in variants {
        if let Some(issue) = variant.structural_issue() {
            debug!(variant = %variant.id, ?issue, "malformed variant");
            report.invalid.push(variant.to_ref(issue));
            continue;
        }

        variant.compare_at_price_ghs = normalize_compare_at(variant.compare_at_price_ghs);
        if let Some(sale) = variant.compare_at_price_ghs {
            if sale >= variant.effective_price(product.price_ghs) {
                report.sale_price_conflicts.push(variant.to_ref(StructuralIssue::SalePriceNotBelowPrice));
                variant.compare_at_price_ghs = None;
            }
        }

        if variant.image.is_none() {
            if let Some(image) = variant.axis_value(image_axis).and_then(|term| resolve_image(term, index)) {
                variant.image = Some(image.to_string());
                report.backfilled += 1;
            }
        }
        report.valid.push(variant);
    }
    report
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BackfillReport {
    pub normalization: NormalizationReport,
    pub persisted: usize,
    pub errors: Vec<ItemFailure>,
}

/// Runs [`normalize`] over a product's stored variants and writes back the images it resolved.
pub async fn backfill_variant_images<S: CatalogStore + ?Sized>(
    store: &S,
    product: &Product,
    index: &TermImageIndex,
    image_axis: &Slug,
    store_timeout: Duration,
) -> Result<BackfillReport> {
    let variants = timed(store_timeout, store.list_variants(&product.id)).await?;
    let missing: HashSet<String> = variants.iter().filter(|v| v.image.is_none()).map(|v| v.id.clone()).collect();
    let normalization = normalize(product, variants, index, image_axis);

    let mut report = BackfillReport::default();
    for variant in normalization.valid.iter().filter(|v| missing.contains(&v.id)) {
        let Some(image) = variant.image.as_deref() else { continue };
        match timed(store_timeout, store.set_variant_image(&variant.id, image)).await {
            Ok(_) => report.persisted += 1,
            Err(e) => {
                warn!(product = %product.slug, variant = %variant.id, error = %e, "image backfill failed");
                let key = NaturalKey::Variant { product_slug: product.slug.clone(), name: variant.name.clone(), value: variant.value.clone() };
                report.errors.push(ItemFailure::new(key, e.to_string()));
            }
        }
    }
    info!(
        product = %product.slug, backfilled = normalization.backfilled, persisted = report.persisted,
        invalid = normalization.invalid.len(), "variant images backfilled"
    );
    report.normalization = normalization;
    Ok(report)
}
