//! Sync events
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::value_objects::Slug;

/// Business identifier used to match records across stores without shared primary keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum NaturalKey {
    Attribute { slug: Slug },
    Term { attribute_slug: Slug, term_slug: Slug },
    Variant { product_slug: Slug, name: String, value: String },
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute { slug } => write!(f, "attribute:{slug}"),
            Self::Term { attribute_slug, term_slug } => write!(f, "term:{attribute_slug}/{term_slug}"),
            Self::Variant { product_slug, name, value } => write!(f, "variant:{product_slug}[{name}={value}]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Created,
    Updated,
    Unchanged,
    /// A record the item depends on is missing in the target.
    NotFound { missing: String },
    /// A null source value was not allowed to overwrite `field` in the target.
    ConflictAvoided { field: &'static str },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub key: NaturalKey,
    pub outcome: ItemOutcome,
}
