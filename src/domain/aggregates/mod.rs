//! Aggregates module
pub mod attribute;
pub mod product;
pub mod variant;

pub use attribute::{Attribute, AttributeDraft, AttributeTerm, AttributeWithTerms, TermDraft};
pub use product::Product;
pub use variant::{NewVariant, StructuralIssue, Variant, VariantRef};
