//! Variant Sync
//!
//! Catalog maintenance engine for the storefront back office.
//!
//! ## Features
//! - Swatch image matching for attribute terms
//! - Variant generation from attribute combinations
//! - Variant normalization and image backfill
//! - Local to production catalog synchronization by natural key

pub mod config;
pub mod domain;
pub mod store;

pub use domain::aggregates::{
    Attribute, AttributeTerm, AttributeWithTerms, NewVariant, Product, Variant, VariantRef,
};
pub use domain::events::{ItemOutcome, NaturalKey, SyncEvent};
pub use domain::services::combinator::{
    generate_variants, plan_variants, CombinationError, GenerationOptions, VariantGenerationResult,
};
pub use domain::services::matcher::{resolve_image, TermImageIndex};
pub use domain::services::normalizer::{
    backfill_variant_images, normalize, BackfillReport, NormalizationReport,
};
pub use domain::services::report::{ItemFailure, PhaseReport, SyncReport};
pub use domain::services::synchronizer::{SyncOptions, SyncScope, Synchronizer};
pub use domain::services::timed;
pub use domain::value_objects::{Quantity, Slug};
pub use store::{CatalogStore, MemoryStore, PgStore, Upserted};

use domain::value_objects::SlugError;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Failure of a single record store call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Storage(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid slug: {0}")]
    InvalidSlug(#[from] SlugError),

    #[error("Invalid sync scope: {0:?}")]
    InvalidScope(String),

    #[error("Invalid variant: {0}")]
    InvalidVariant(#[from] validator::ValidationErrors),

    #[error("Cannot enumerate source {entity}: {source}")]
    Enumeration {
        entity: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
