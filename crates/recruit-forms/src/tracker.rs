//! Completion Tracker
//!
//! Holds the set of fields currently valid and non-empty. Everything else
//! (totals, percent, per-section status) is derived on demand from that
//! set and the required fields captured at construction.

use crate::registry::FieldRegistry;
use crate::rules::ValidationVerdict;
use serde::Serialize;
use std::collections::HashSet;

/// Completion state of one section's required fields
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Empty,
    Partial,
    Complete,
}

/// One progress step, one per section in schema order
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    pub section: String,
    pub status: SectionStatus,
}

/// Snapshot of overall progress
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub steps: Vec<StepIndicator>,
}

#[derive(Debug, Default)]
pub struct CompletionTracker {
    completed: HashSet<String>,
    /// (section name, required field names)
    required: Vec<(String, Vec<String>)>,
}

impl CompletionTracker {
    pub fn new(registry: &FieldRegistry) -> Self {
        let required = registry
            .sections_in_order()
            .iter()
            .map(|s| (s.name.clone(), s.required().map(|f| f.name.clone()).collect()))
            .collect();
        Self { completed: HashSet::new(), required }
    }

    /// Count a field complete iff it is valid and has a value
    pub fn record(&mut self, field: &str, verdict: &ValidationVerdict, has_value: bool) {
        if verdict.is_valid() && has_value {
            if !self.completed.contains(field) {
                self.completed.insert(field.to_string());
            }
        } else {
            self.completed.remove(field);
        }
    }

    /// Drop a field from the set without a verdict
    pub fn forget(&mut self, field: &str) {
        self.completed.remove(field);
    }

    pub fn is_complete(&self, field: &str) -> bool {
        self.completed.contains(field)
    }

    pub fn required_total(&self) -> usize {
        self.required.iter().map(|(_, names)| names.len()).sum()
    }

    pub fn required_completed(&self) -> usize {
        self.required
            .iter()
            .flat_map(|(_, names)| names.iter())
            .filter(|n| self.completed.contains(n.as_str()))
            .count()
    }

    /// Rounded completion percentage, 0 when nothing is required
    pub fn percent(&self) -> u8 {
        let total = self.required_total();
        if total == 0 {
            return 0;
        }
        let done = self.required_completed();
        ((done as f64 * 100.0 / total as f64).round() as u8).min(100)
    }

    /// Unknown sections and sections without required fields report `Empty`
    pub fn section_status(&self, section: &str) -> SectionStatus {
        let Some((_, names)) = self.required.iter().find(|(name, _)| name == section) else {
            return SectionStatus::Empty;
        };
        let done = names.iter().filter(|n| self.completed.contains(n.as_str())).count();
        match done {
            0 => SectionStatus::Empty,
            d if d == names.len() => SectionStatus::Complete,
            _ => SectionStatus::Partial,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.required_completed(),
            total: self.required_total(),
            percent: self.percent(),
            steps: self
                .required
                .iter()
                .map(|(section, _)| StepIndicator {
                    section: section.clone(),
                    status: self.section_status(section),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldKind, Schema};
    use proptest::prelude::*;

    fn tracker() -> CompletionTracker {
        let f = |n: &str, r: bool| FieldDescriptor::new(n, n, FieldKind::Text, r);
        let schema = Schema::new()
            .with_section("Personal", vec![f("first", true), f("last", true), f("nick", false)])
            .with_section("Work", vec![f("role", true)])
            .with_section("Extra", vec![f("notes", false)]);
        CompletionTracker::new(&FieldRegistry::load(schema, 1024).unwrap())
    }

    #[test]
    fn test_record_and_status() {
        let mut t = tracker();
        assert_eq!(t.required_total(), 3);
        assert_eq!(t.section_status("Personal"), SectionStatus::Empty);

        t.record("first", &ValidationVerdict::Valid, true);
        assert_eq!(t.section_status("Personal"), SectionStatus::Partial);
        assert_eq!(t.percent(), 33);

        t.record("last", &ValidationVerdict::Valid, true);
        t.record("nick", &ValidationVerdict::Valid, true);
        assert_eq!(t.section_status("Personal"), SectionStatus::Complete);
        assert_eq!(t.required_completed(), 2);
        assert_eq!(t.percent(), 67);

        t.record("first", &ValidationVerdict::Invalid("bad".into()), true);
        assert_eq!(t.section_status("Personal"), SectionStatus::Partial);
        t.record("last", &ValidationVerdict::Valid, false);
        assert_eq!(t.section_status("Personal"), SectionStatus::Empty);
    }

    #[test]
    fn test_sections_without_required_fields_are_empty() {
        let mut t = tracker();
        t.record("notes", &ValidationVerdict::Valid, true);
        assert_eq!(t.section_status("Extra"), SectionStatus::Empty);
        assert_eq!(t.section_status("Nope"), SectionStatus::Empty);
    }

    #[test]
    fn test_progress_steps_follow_schema_order() {
        let mut t = tracker();
        t.record("role", &ValidationVerdict::Valid, true);
        let p = t.progress();
        assert_eq!((p.completed, p.total, p.percent), (1, 3, 33));
        let steps: Vec<_> = p.steps.iter().map(|s| (s.section.as_str(), s.status)).collect();
        assert_eq!(
            steps,
            vec![
                ("Personal", SectionStatus::Empty),
                ("Work", SectionStatus::Complete),
                ("Extra", SectionStatus::Empty),
            ]
        );
    }

    #[test]
    fn test_zero_required_is_zero_percent() {
        let schema = Schema::new().with_section("Only", vec![FieldDescriptor::new("a", "A", FieldKind::Text, false)]);
        let mut t = CompletionTracker::new(&FieldRegistry::load(schema, 1024).unwrap());
        t.record("a", &ValidationVerdict::Valid, true);
        assert_eq!(t.required_total(), 0);
        assert_eq!(t.percent(), 0);
    }

    proptest! {
        #[test]
        fn percent_stays_in_bounds(ops in proptest::collection::vec((0usize..5, any::<bool>(), any::<bool>()), 0..40)) {
            let names = ["first", "last", "nick", "role", "notes"];
            let mut t = tracker();
            for (idx, valid, has_value) in ops {
                let verdict = if valid { ValidationVerdict::Valid } else { ValidationVerdict::Invalid("x".into()) };
                t.record(names[idx], &verdict, has_value);
                prop_assert!(t.percent() <= 100);
                prop_assert!(t.required_completed() <= t.required_total());
            }
        }

        #[test]
        fn record_is_idempotent(idx in 0usize..5) {
            let names = ["first", "last", "nick", "role", "notes"];
            let mut t = tracker();
            t.record(names[idx], &ValidationVerdict::Valid, true);
            let once = t.progress();
            t.record(names[idx], &ValidationVerdict::Valid, true);
            prop_assert_eq!(once, t.progress());
            prop_assert!(t.is_complete(names[idx]));
        }
    }
}
