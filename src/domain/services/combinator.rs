//! Variant generation from attribute combinations.

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

use super::timed;
use crate::domain::aggregates::{AttributeTerm, AttributeWithTerms, NewVariant, Product, Variant};
use crate::domain::value_objects::Slug;
use crate::store::CatalogStore;
use crate::Result;

#[derive(Clone, Debug)]
pub struct GenerationOptions {
    /// Attribute whose term images are copied onto generated variants.
    pub image_attribute: Option<Slug>,
    pub store_timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { image_attribute: Slug::new("color").ok(), store_timeout: Duration::from_secs(10) }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct VariantGenerationResult {
    pub created: Vec<Variant>,
    pub errors: Vec<CombinationError>,
    /// The product already had variants, so nothing was generated.
    pub refused: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CombinationError {
    pub name: String,
    pub value: String,
    pub reason: String,
}

/// Expands `attributes` into one variant per term combination, in attribute order.
///
/// Attributes without terms are ignored. Names and values are joined with `" / "`.
pub fn plan_variants(product: &Product, attributes: &[AttributeWithTerms], image_attribute: Option<&Slug>) -> Vec<NewVariant> {
    let axes: Vec<&AttributeWithTerms> = attributes.iter().filter(|a| !a.is_empty()).collect();
    if axes.is_empty() { return Vec::new(); }

    let name = axes.iter().map(|a| a.name()).collect::<Vec<_>>().join(" / ");
    let image_axis = image_attribute.and_then(|slug| axes.iter().position(|a| a.slug() == slug));

    cartesian(&axes)
        .into_iter()
        .map(|combo| NewVariant {
            name: name.clone(),
            value: combo.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(" / "),
            image: image_axis.and_then(|i| combo[i].image.clone()),
            price_ghs: Some(product.price_ghs),
            compare_at_price_ghs: None,
            stock: product.default_stock(),
            sku: None,
        })
        .collect()
}

fn cartesian<'a>(axes: &[&'a AttributeWithTerms]) -> Vec<Vec<&'a AttributeTerm>> {
    let mut combos: Vec<Vec<&'a AttributeTerm>> = vec![Vec::new()];
    for &axis in axes {
        combos = combos
            .iter()
            .flat_map(|prefix| axis.terms.iter().map(move |term| {
                let mut combo = prefix.clone();
                combo.push(term);
                combo
            }))
            .collect();
    }
    combos
}

/// Creates every planned variant for a product that has none yet.
///
/// A product that already owns variants is left untouched and the result is
/// marked `refused`. Each combination is created independently; failures are
/// collected in `errors` and do not stop the remaining combinations.
pub async fn generate_variants<S: CatalogStore + ?Sized>(
    store: &S,
    product: &Product,
    attributes: &[AttributeWithTerms],
    options: &GenerationOptions,
) -> Result<VariantGenerationResult> {
    let existing = timed(options.store_timeout, store.list_variants(&product.id)).await?;
    if !existing.is_empty() {
        info!(product = %product.slug, existing = existing.len(), "product already has variants, skipping generation");
        return Ok(VariantGenerationResult { refused: true, ..Default::default() });
    }

    let mut result = VariantGenerationResult::default();
    for fields in plan_variants(product, attributes, options.image_attribute.as_ref()) {
        let created = match fields.validate() {
            Ok(()) => timed(options.store_timeout, store.create_variant(&product.id, &fields)).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match created {
            Ok(variant) => result.created.push(variant),
            Err(reason) => {
                warn!(product = %product.slug, value = %fields.value, %reason, "variant creation failed");
                result.errors.push(CombinationError { name: fields.name, value: fields.value, reason });
            }
        }
    }
    info!(product = %product.slug, created = result.created.len(), failed = result.errors.len(), "variants generated");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Attribute;
    use crate::domain::value_objects::Quantity;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn slug(s: &str) -> Slug { Slug::new(s).unwrap() }

    fn axis(name: &str, terms: &[(&str, Option<&str>)]) -> AttributeWithTerms {
        let attribute = Attribute { id: name.to_lowercase(), name: name.into(), slug: Slug::from_name(name).unwrap(), description: None };
        let terms = terms.iter().map(|(t, image)| AttributeTerm {
            id: format!("{name}-{t}"), attribute_id: attribute.id.clone(), name: (*t).into(),
            slug: Slug::from_name(t).unwrap(), image: image.map(String::from),
        }).collect();
        AttributeWithTerms::new(attribute, terms)
    }

    fn product(store: &MemoryStore) -> Product {
        store.seed_product(slug("body-wave"), "Body Wave", Decimal::new(1200, 0), Some(Quantity::new(4)))
    }

    fn color_and_length() -> Vec<AttributeWithTerms> {
        vec![
            axis("Color", &[("Black", Some("/media/swatches/black.png")), ("Blonde", None)]),
            axis("Length", &[("12in", None), ("16in", None)]),
        ]
    }

    #[test]
    fn test_plan_color_by_length() {
        let store = MemoryStore::new();
        let plan = plan_variants(&product(&store), &color_and_length(), Some(&slug("color")));
        let got: Vec<(&str, &str, Option<&str>)> = plan.iter().map(|v| (v.name.as_str(), v.value.as_str(), v.image.as_deref())).collect();
        assert_eq!(got, vec![
            ("Color / Length", "Black / 12in", Some("/media/swatches/black.png")),
            ("Color / Length", "Black / 16in", Some("/media/swatches/black.png")),
            ("Color / Length", "Blonde / 12in", None),
            ("Color / Length", "Blonde / 16in", None),
        ]);
        assert!(plan.iter().all(|v| v.price_ghs == Some(Decimal::new(1200, 0)) && v.stock.value() == 4));
        assert!(plan.iter().all(|v| v.compare_at_price_ghs.is_none()));
    }

    #[test]
    fn test_plan_is_complete_and_unique() {
        let store = MemoryStore::new();
        let attrs = vec![
            axis("Color", &[("Black", None), ("Brown", None), ("Honey", None)]),
            axis("Length", &[("10in", None), ("12in", None)]),
            axis("Density", &[("150%", None), ("180%", None), ("200%", None), ("250%", None)]),
        ];
        let plan = plan_variants(&product(&store), &attrs, None);
        assert_eq!(plan.len(), 3 * 2 * 4);
        let unique: HashSet<(&str, &str)> = plan.iter().map(|v| (v.name.as_str(), v.value.as_str())).collect();
        assert_eq!(unique.len(), plan.len());
    }

    #[test]
    fn test_plan_skips_empty_attributes() {
        let store = MemoryStore::new();
        let attrs = vec![axis("Color", &[("Black", None), ("Ash", None)]), axis("Finish", &[])];
        let plan = plan_variants(&product(&store), &attrs, None);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].name, "Color");
        assert_eq!(plan[1].value, "Ash");
        assert!(plan_variants(&product(&store), &[axis("Finish", &[])], None).is_empty());
    }

    #[test]
    fn test_plan_image_attribute_not_first() {
        let store = MemoryStore::new();
        let attrs = vec![axis("Length", &[("12in", None)]), axis("Color", &[("Black", Some("b.png"))])];
        let plan = plan_variants(&product(&store), &attrs, Some(&slug("color")));
        assert_eq!(plan[0].image.as_deref(), Some("b.png"));
        let plan = plan_variants(&product(&store), &attrs, None);
        assert_eq!(plan[0].image, None);
    }

    #[tokio::test]
    async fn test_generate_creates_variants() {
        let store = MemoryStore::new();
        let p = product(&store);
        let result = generate_variants(&store, &p, &color_and_length(), &GenerationOptions::default()).await.unwrap();
        assert!(!result.refused);
        assert_eq!(result.created.len(), 4);
        assert!(result.errors.is_empty());
        assert_eq!(store.list_variants(&p.id).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_generate_refuses_when_variants_exist() {
        let store = MemoryStore::new();
        let p = product(&store);
        generate_variants(&store, &p, &color_and_length(), &GenerationOptions::default()).await.unwrap();
        let writes = store.write_count();

        let again = generate_variants(&store, &p, &color_and_length(), &GenerationOptions::default()).await.unwrap();
        assert!(again.refused);
        assert!(again.created.is_empty());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_generate_isolates_failures() {
        let store = MemoryStore::new();
        let p = product(&store);
        store.fail_writes_for("Blonde / 12in");
        let result = generate_variants(&store, &p, &color_and_length(), &GenerationOptions::default()).await.unwrap();
        assert_eq!(result.created.len(), 3);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].value, "Blonde / 12in");
    }
}
