//! Attribute Aggregate

use serde::{Deserialize, Serialize};
use crate::domain::value_objects::Slug;

/// A named axis of variation ("Color", "Length").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
}

/// One allowed value of an attribute. `image` is the canonical swatch for the term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTerm {
    pub id: String,
    pub attribute_id: String,
    pub name: String,
    pub slug: Slug,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeWithTerms {
    pub attribute: Attribute,
    pub terms: Vec<AttributeTerm>,
}

impl AttributeWithTerms {
    pub fn new(attribute: Attribute, terms: Vec<AttributeTerm>) -> Self { Self { attribute, terms } }
    pub fn slug(&self) -> &Slug { &self.attribute.slug }
    pub fn name(&self) -> &str { &self.attribute.name }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

/// Fields written when upserting an attribute by slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDraft {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
}

impl From<&Attribute> for AttributeDraft {
    fn from(a: &Attribute) -> Self {
        Self { name: a.name.clone(), slug: a.slug.clone(), description: a.description.clone() }
    }
}

/// Fields written when upserting a term by (attribute, slug).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDraft {
    pub name: String,
    pub slug: Slug,
    pub image: Option<String>,
}
