//! Swatch image matching for attribute terms.
//!
//! Variants and terms are linked only by their names, so every lookup goes
//! through one [`TermImageIndex`] built per pass and handed to the callers.

use std::collections::HashMap;
use crate::domain::aggregates::AttributeTerm;

/// Hair colour keywords tried as a last resort. Multi-word entries come first.
pub const HAIR_COLOR_KEYWORDS: [&str; 32] = [
    "jet black", "off black", "natural black", "dark brown", "light brown", "honey blonde",
    "ash blonde", "platinum blonde", "strawberry blonde",
    "black", "brown", "chestnut", "chocolate", "mocha", "auburn", "copper", "ginger", "red",
    "burgundy", "wine", "blonde", "honey", "golden", "caramel", "bronze", "cinnamon", "ash",
    "platinum", "grey", "gray", "silver", "ombre",
];

/// Lowercased, trimmed form used for every key and lookup.
pub fn normalize_label(label: &str) -> String { label.trim().to_lowercase() }

fn compact(label: &str) -> String {
    label.chars().filter(|c| !(c.is_whitespace() || *c == '/' || *c == '-')).collect()
}

/// Insertion-ordered map from normalized colour label to image URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermImageIndex {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl TermImageIndex {
    pub fn new() -> Self { Self::default() }

    /// Indexes terms by name, skipping terms without an image.
    pub fn from_terms<'a>(terms: impl IntoIterator<Item = &'a AttributeTerm>) -> Self {
        let mut index = Self::new();
        for term in terms {
            if let Some(image) = term.image.as_deref().filter(|i| !i.trim().is_empty()) {
                index.insert(&term.name, image);
            }
        }
        index
    }

    /// Adds a candidate. Blank labels are ignored and the first image for a label wins.
    pub fn insert(&mut self, label: &str, image: impl Into<String>) -> bool {
        let key = normalize_label(label);
        if key.is_empty() || self.positions.contains_key(&key) { return false; }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, image.into()));
        true
    }

    pub fn get(&self, label: &str) -> Option<&str> { self.lookup(&normalize_label(label)) }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.positions.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl<L: AsRef<str>, I: Into<String>> FromIterator<(L, I)> for TermImageIndex {
    fn from_iter<T: IntoIterator<Item = (L, I)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (label, image) in iter { index.insert(label.as_ref(), image); }
        index
    }
}

/// Resolves the swatch image for `term`. First hit wins, in this order:
///
/// 1. exact label
/// 2. label containing, or contained in, a candidate key (index order)
/// 3. any whitespace/slash/hyphen separated token longer than two characters
/// 4. a known hair colour keyword present in the term that is also a candidate key,
///    compared with separators removed
///
/// `None` means "leave the image alone", never "clear it".
pub fn resolve_image<'a>(term: &str, index: &'a TermImageIndex) -> Option<&'a str> {
    let needle = normalize_label(term);
    if needle.is_empty() || index.is_empty() { return None; }

    if let Some(image) = index.lookup(&needle) { return Some(image); }

    if let Some((_, image)) = index.iter().find(|(key, _)| needle.contains(key) || key.contains(needle.as_str())) {
        return Some(image);
    }

    // Any token equal to a key is already a substring hit above; this step only pins the documented order.
    let token_hit = needle
        .split(|c: char| c.is_whitespace() || c == '/' || c == '-')
        .filter(|token| token.chars().count() > 2)
        .find_map(|token| index.lookup(token));
    if token_hit.is_some() { return token_hit; }

    let compact_needle = compact(&needle);
    HAIR_COLOR_KEYWORDS
        .iter()
        .filter(|keyword| compact_needle.contains(&compact(keyword)))
        .find_map(|keyword| index.lookup(keyword))
}
