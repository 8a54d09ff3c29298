/// Central registry mapping check categories to ordered check names, plus
/// the function table the pipeline executes.
///
/// The registry is an explicit object constructed once at process start and
/// passed by reference to consumers; tests get isolation by constructing a
/// fresh registry (or calling `clear`) instead of mutating process-wide
/// state.
use std::collections::BTreeMap;

use tracing::debug;

use crate::checks::CheckFn;

#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: BTreeMap<String, Vec<String>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check name under a category. Idempotent: the first
    /// registration appends, repeats are no-ops. Returns whether the name
    /// was newly added.
    pub fn add_if_absent(&mut self, category: &str, name: &str) -> bool {
        let names = self.checks.entry(category.to_string()).or_default();
        if names.iter().any(|n| n == name) {
            debug!(category, name, "check already registered");
            return false;
        }
        debug!(category, name, "registered check");
        names.push(name.to_string());
        true
    }

    /// The full category -> check-name table.
    pub fn category_mappings(&self) -> &BTreeMap<String, Vec<String>> {
        &self.checks
    }

    /// Check names for a category. Unknown categories yield an empty slice,
    /// not an error.
    pub fn checks_for(&self, category: &str) -> &[String] {
        self.checks
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reset all state. Test isolation only.
    pub fn clear(&mut self) {
        self.checks.clear();
    }
}

/// Table of executable check functions keyed by check name.
///
/// Kept separate from `CheckRegistry` so the category table stays a plain
/// data structure that discovery validation can diff against declarations.
#[derive(Default)]
pub struct CheckSet {
    fns: BTreeMap<String, CheckFn>,
}

impl CheckSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, check: CheckFn) {
        self.fns.insert(name.to_string(), check);
    }

    pub fn get(&self, name: &str) -> Option<CheckFn> {
        self.fns.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut registry = CheckRegistry::new();
        assert!(registry.add_if_absent("headings", "check_heading_structure"));
        assert!(!registry.add_if_absent("headings", "check_heading_structure"));
        assert_eq!(registry.checks_for("headings").len(), 1);
    }

    #[test]
    fn unknown_category_yields_empty_list() {
        let registry = CheckRegistry::new();
        assert!(registry.checks_for("nope").is_empty());
    }

    #[test]
    fn registration_preserves_order_within_category() {
        let mut registry = CheckRegistry::new();
        registry.add_if_absent("format", "check_boilerplate");
        registry.add_if_absent("format", "check_date_format");
        assert_eq!(
            registry.checks_for("format"),
            ["check_boilerplate", "check_date_format"]
        );
    }

    #[test]
    fn clear_resets_all_state() {
        let mut registry = CheckRegistry::new();
        registry.add_if_absent("terminology", "check_required_language");
        registry.clear();
        assert!(registry.category_mappings().is_empty());
    }
}
