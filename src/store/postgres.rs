//! Postgres-backed catalog store.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{CatalogStore, StoreResult, Upserted};
use crate::domain::aggregates::{
    Attribute, AttributeDraft, AttributeTerm, NewVariant, Product, TermDraft, Variant,
};
use crate::domain::value_objects::{Quantity, Slug};
use crate::StoreError;

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
    pub fn pool(&self) -> &PgPool { &self.pool }
}

#[derive(Debug, sqlx::FromRow)]
struct AttributeRow {
    id: Uuid, name: String, slug: String, description: Option<String>,
    #[sqlx(default)] inserted: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct TermRow {
    id: Uuid, attribute_id: Uuid, name: String, slug: String, image: Option<String>,
    #[sqlx(default)] inserted: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow { id: Uuid, slug: String, name: String, price_ghs: Decimal, stock: Option<i32> }

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: Uuid, product_id: Uuid, name: String, value: String, image: Option<String>,
    price_ghs: Option<Decimal>, compare_at_price_ghs: Option<Decimal>, stock: i32, sku: Option<String>,
    #[sqlx(default)] inserted: bool,
}

fn slug(raw: String) -> StoreResult<Slug> {
    Slug::new(raw.clone()).map_err(|e| StoreError::InvalidRecord(format!("slug {raw:?}: {e}")))
}

fn stock(id: Uuid, raw: i32) -> StoreResult<Quantity> {
    Quantity::try_from(raw).map_err(|e| StoreError::InvalidRecord(format!("{id}: {e}")))
}

fn stock_column(quantity: Quantity) -> StoreResult<i32> {
    i32::try_from(quantity).map_err(|e| StoreError::InvalidRecord(e.to_string()))
}

/// Converts listed rows, skipping the ones that do not map onto the domain so a
/// single bad record cannot fail the whole listing.
fn readable_rows<R, T>(entity: &'static str, rows: Vec<R>, convert: impl Fn(R) -> StoreResult<T>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match convert(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(entity, error = %e, "skipping unreadable row");
                None
            }
        })
        .collect()
}

fn uuid(id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(id).map_err(|e| StoreError::InvalidRecord(format!("id {id:?}: {e}")))
}

impl AttributeRow {
    fn into_domain(self) -> StoreResult<Attribute> {
        Ok(Attribute { id: self.id.to_string(), name: self.name, slug: slug(self.slug)?, description: self.description })
    }
}

impl TermRow {
    fn into_domain(self) -> StoreResult<AttributeTerm> {
        Ok(AttributeTerm {
            id: self.id.to_string(), attribute_id: self.attribute_id.to_string(), name: self.name,
            slug: slug(self.slug)?, image: self.image,
        })
    }
}

impl ProductRow {
    fn into_domain(self) -> StoreResult<Product> {
        Ok(Product {
            id: self.id.to_string(), slug: slug(self.slug)?, name: self.name, price_ghs: self.price_ghs,
            stock: self.stock.map(|raw| stock(self.id, raw)).transpose()?,
        })
    }
}

impl VariantRow {
    fn into_domain(self) -> StoreResult<Variant> {
        Ok(Variant {
            id: self.id.to_string(), product_id: self.product_id.to_string(), name: self.name, value: self.value,
            image: self.image, price_ghs: self.price_ghs, compare_at_price_ghs: self.compare_at_price_ghs,
            stock: stock(self.id, self.stock)?, sku: self.sku,
        })
    }
}

const ATTRIBUTE_COLS: &str = "id, name, slug, description";
const TERM_COLS: &str = "id, attribute_id, name, slug, image";
const VARIANT_COLS: &str = "id, product_id, name, value, image, price_ghs, compare_at_price_ghs, stock, sku";

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_attributes(&self) -> StoreResult<Vec<Attribute>> {
        let sql = format!("SELECT {ATTRIBUTE_COLS} FROM product_attributes ORDER BY created_at, slug");
        let rows = sqlx::query_as::<_, AttributeRow>(&sql).fetch_all(&self.pool).await?;
        Ok(readable_rows("attribute", rows, AttributeRow::into_domain))
    }

    async fn list_terms(&self, attribute_id: &str) -> StoreResult<Vec<AttributeTerm>> {
        let sql = format!("SELECT {TERM_COLS} FROM product_attribute_terms WHERE attribute_id = $1 ORDER BY created_at, slug");
        let rows = sqlx::query_as::<_, TermRow>(&sql).bind(uuid(attribute_id)?).fetch_all(&self.pool).await?;
        Ok(readable_rows("term", rows, TermRow::into_domain))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT id, slug, name, price_ghs, stock FROM products ORDER BY slug")
            .fetch_all(&self.pool).await?;
        Ok(readable_rows("product", rows, ProductRow::into_domain))
    }

    async fn list_variants(&self, product_id: &str) -> StoreResult<Vec<Variant>> {
        let sql = format!("SELECT {VARIANT_COLS} FROM product_variants WHERE product_id = $1 ORDER BY created_at, name, value");
        let rows = sqlx::query_as::<_, VariantRow>(&sql).bind(uuid(product_id)?).fetch_all(&self.pool).await?;
        Ok(readable_rows("variant", rows, VariantRow::into_domain))
    }

    async fn find_attribute(&self, slug: &Slug) -> StoreResult<Option<Attribute>> {
        let sql = format!("SELECT {ATTRIBUTE_COLS} FROM product_attributes WHERE slug = $1");
        let row = sqlx::query_as::<_, AttributeRow>(&sql).bind(slug.as_str()).fetch_optional(&self.pool).await?;
        row.map(AttributeRow::into_domain).transpose()
    }

    async fn find_term(&self, attribute_id: &str, slug: &Slug) -> StoreResult<Option<AttributeTerm>> {
        let sql = format!("SELECT {TERM_COLS} FROM product_attribute_terms WHERE attribute_id = $1 AND slug = $2");
        let row = sqlx::query_as::<_, TermRow>(&sql)
            .bind(uuid(attribute_id)?).bind(slug.as_str()).fetch_optional(&self.pool).await?;
        row.map(TermRow::into_domain).transpose()
    }

    async fn find_product(&self, slug: &Slug) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT id, slug, name, price_ghs, stock FROM products WHERE slug = $1")
            .bind(slug.as_str()).fetch_optional(&self.pool).await?;
        row.map(ProductRow::into_domain).transpose()
    }

    async fn find_variant(&self, product_id: &str, name: &str, value: &str) -> StoreResult<Option<Variant>> {
        let sql = format!("SELECT {VARIANT_COLS} FROM product_variants WHERE product_id = $1 AND name = $2 AND value = $3");
        let row = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(uuid(product_id)?).bind(name).bind(value).fetch_optional(&self.pool).await?;
        row.map(VariantRow::into_domain).transpose()
    }

    async fn upsert_attribute(&self, draft: &AttributeDraft) -> StoreResult<Upserted<Attribute>> {
        let sql = format!(
            "INSERT INTO product_attributes (id, name, slug, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description, updated_at = NOW() \
             RETURNING {ATTRIBUTE_COLS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(Uuid::now_v7()).bind(&draft.name).bind(draft.slug.as_str()).bind(&draft.description)
            .fetch_one(&self.pool).await?;
        let created = row.inserted;
        Ok(Upserted { record: row.into_domain()?, created })
    }

    async fn upsert_term(&self, attribute_id: &str, draft: &TermDraft) -> StoreResult<Upserted<AttributeTerm>> {
        let sql = format!(
            "INSERT INTO product_attribute_terms (id, attribute_id, name, slug, image, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             ON CONFLICT (attribute_id, slug) DO UPDATE SET name = EXCLUDED.name, \
               image = COALESCE(EXCLUDED.image, product_attribute_terms.image), updated_at = NOW() \
             RETURNING {TERM_COLS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, TermRow>(&sql)
            .bind(Uuid::now_v7()).bind(uuid(attribute_id)?).bind(&draft.name).bind(draft.slug.as_str()).bind(&draft.image)
            .fetch_one(&self.pool).await?;
        let created = row.inserted;
        Ok(Upserted { record: row.into_domain()?, created })
    }

    async fn upsert_variant(&self, product_id: &str, fields: &NewVariant) -> StoreResult<Upserted<Variant>> {
        let sql = format!(
            "INSERT INTO product_variants (id, product_id, name, value, image, price_ghs, compare_at_price_ghs, stock, sku, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) \
             ON CONFLICT (product_id, name, value) DO UPDATE SET \
               image = COALESCE(EXCLUDED.image, product_variants.image), price_ghs = EXCLUDED.price_ghs, \
               compare_at_price_ghs = EXCLUDED.compare_at_price_ghs, stock = EXCLUDED.stock, \
               sku = COALESCE(EXCLUDED.sku, product_variants.sku), updated_at = NOW() \
             RETURNING {VARIANT_COLS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(Uuid::now_v7()).bind(uuid(product_id)?).bind(&fields.name).bind(&fields.value).bind(&fields.image)
            .bind(fields.price_ghs).bind(fields.compare_at_price_ghs).bind(stock_column(fields.stock)?).bind(&fields.sku)
            .fetch_one(&self.pool).await?;
        let created = row.inserted;
        Ok(Upserted { record: row.into_domain()?, created })
    }

    async fn create_variant(&self, product_id: &str, fields: &NewVariant) -> StoreResult<Variant> {
        let sql = format!(
            "INSERT INTO product_variants (id, product_id, name, value, image, price_ghs, compare_at_price_ghs, stock, sku, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) RETURNING {VARIANT_COLS}"
        );
        let row = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(Uuid::now_v7()).bind(uuid(product_id)?).bind(&fields.name).bind(&fields.value).bind(&fields.image)
            .bind(fields.price_ghs).bind(fields.compare_at_price_ghs).bind(stock_column(fields.stock)?).bind(&fields.sku)
            .fetch_one(&self.pool).await?;
        row.into_domain()
    }

    async fn set_variant_image(&self, variant_id: &str, image: &str) -> StoreResult<Variant> {
        let sql = format!("UPDATE product_variants SET image = $2, updated_at = NOW() WHERE id = $1 RETURNING {VARIANT_COLS}");
        let row = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(uuid(variant_id)?).bind(image).fetch_optional(&self.pool).await?
            .ok_or_else(|| StoreError::NotFound(format!("variant {variant_id}")))?;
        row.into_domain()
    }
}
