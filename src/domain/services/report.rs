//! Structured outcome of a sync run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::events::{ItemOutcome, NaturalKey, SyncEvent};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub key: NaturalKey,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(key: NaturalKey, reason: impl Into<String>) -> Self { Self { key, reason: reason.into() } }
}

/// Counters and per-item events for one entity type.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PhaseReport {
    pub created: usize,
    pub updated: usize,
    /// Items already up to date plus items whose dependency is missing in the target.
    pub skipped: usize,
    pub conflicts_avoided: usize,
    pub not_found: Vec<NaturalKey>,
    pub errors: Vec<ItemFailure>,
    pub events: Vec<SyncEvent>,
}

impl PhaseReport {
    pub fn record(&mut self, key: NaturalKey, outcome: ItemOutcome) {
        match &outcome {
            ItemOutcome::Created => self.created += 1,
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Unchanged => self.skipped += 1,
            ItemOutcome::NotFound { .. } => {
                self.skipped += 1;
                self.not_found.push(key.clone());
            }
            ItemOutcome::ConflictAvoided { .. } => self.conflicts_avoided += 1,
            ItemOutcome::Failed { reason } => self.errors.push(ItemFailure::new(key.clone(), reason.clone())),
        }
        self.events.push(SyncEvent { key, outcome });
    }

    pub fn processed(&self) -> usize { self.created + self.updated + self.skipped + self.errors.len() }
}

#[derive(Clone, Debug, Serialize)]
pub struct SyncReport {
    pub attributes: PhaseReport,
    pub terms: PhaseReport,
    pub variants: PhaseReport,
    /// The run stopped early on a cancellation signal.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    pub fn start() -> Self {
        Self {
            attributes: PhaseReport::default(), terms: PhaseReport::default(), variants: PhaseReport::default(),
            cancelled: false, started_at: Utc::now(), finished_at: None,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    fn phases(&self) -> [&PhaseReport; 3] { [&self.attributes, &self.terms, &self.variants] }

    pub fn created(&self) -> usize { self.phases().iter().map(|p| p.created).sum() }
    pub fn updated(&self) -> usize { self.phases().iter().map(|p| p.updated).sum() }
    pub fn skipped(&self) -> usize { self.phases().iter().map(|p| p.skipped).sum() }
    pub fn conflicts_avoided(&self) -> usize { self.phases().iter().map(|p| p.conflicts_avoided).sum() }
    pub fn error_count(&self) -> usize { self.phases().iter().map(|p| p.errors.len()).sum() }

    /// True when the run wrote nothing.
    pub fn is_noop(&self) -> bool { self.created() == 0 && self.updated() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Slug;

    #[test]
    fn test_record_counts() {
        let key = |s: &str| NaturalKey::Attribute { slug: Slug::new(s).unwrap() };
        let mut phase = PhaseReport::default();
        phase.record(key("color"), ItemOutcome::Created);
        phase.record(key("length"), ItemOutcome::Unchanged);
        phase.record(key("finish"), ItemOutcome::NotFound { missing: "attribute finish".into() });
        phase.record(key("texture"), ItemOutcome::Failed { reason: "timeout".into() });
        phase.record(key("length"), ItemOutcome::ConflictAvoided { field: "description" });

        assert_eq!((phase.created, phase.updated, phase.skipped), (1, 0, 2));
        assert_eq!(phase.not_found, vec![key("finish")]);
        assert_eq!(phase.errors, vec![ItemFailure::new(key("texture"), "timeout")]);
        assert_eq!(phase.conflicts_avoided, 1);
        assert_eq!(phase.processed(), 4);
        assert_eq!(phase.events.len(), 5);

        let mut report = SyncReport::start();
        report.terms = phase;
        assert_eq!(report.created(), 1);
        assert!(!report.is_noop());
        assert!(report.finish().finished_at.is_some());
    }
}
