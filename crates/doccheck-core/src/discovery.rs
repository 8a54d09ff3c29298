/// Declared-vs-registered check validation.
///
/// Check modules declare their checks explicitly (`checks::modules`), and
/// separately register them into a `CheckRegistry`. `validate` diffs the two
/// tables and reports drift in three buckets. This is a build-time/test-time
/// consistency lint, not a runtime dependency of document processing.
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::checks;
use crate::registry::CheckRegistry;

/// Discrepancies between declared and registered checks.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RegistryValidation {
    /// Categories declared in check modules but absent from the registry.
    pub missing_categories: Vec<String>,
    /// Checks declared under a category but not registered anywhere.
    pub missing_checks: Vec<String>,
    /// Checks registered but declared nowhere (registry drift / dead entries).
    pub extra_checks: Vec<String>,
}

impl RegistryValidation {
    pub fn is_clean(&self) -> bool {
        self.missing_categories.is_empty()
            && self.missing_checks.is_empty()
            && self.extra_checks.is_empty()
    }
}

/// The category mapping actually declared in code, built from the fixed
/// module list. A module with no declarations degrades the result but never
/// aborts the scan.
pub fn discover() -> BTreeMap<String, Vec<String>> {
    let mut mappings: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (module, declarations) in checks::modules() {
        if declarations.is_empty() {
            warn!(module, "check module declares no checks, skipping");
            continue;
        }
        for decl in declarations {
            let names = mappings.entry(decl.category.to_string()).or_default();
            if !names.iter().any(|n| n == decl.name) {
                names.push(decl.name.to_string());
            }
        }
        debug!(module, "processed check module declarations");
    }
    mappings
}

/// Diff the declared table against the registry's.
pub fn validate(registry: &CheckRegistry) -> RegistryValidation {
    let declared = discover();
    let registered = registry.category_mappings();
    let mut results = RegistryValidation::default();

    for category in declared.keys() {
        if !registered.contains_key(category) {
            results.missing_categories.push(category.clone());
        }
    }

    // Declared but unregistered. A check registered under a different
    // category still counts as registered.
    for (category, names) in &declared {
        for name in names {
            let in_category = registered
                .get(category)
                .is_some_and(|r| r.iter().any(|n| n == name));
            let elsewhere = registered
                .iter()
                .any(|(c, r)| c != category && r.iter().any(|n| n == name));
            if !in_category && !elsewhere {
                results.missing_checks.push(format!("{category}.{name}"));
            }
        }
    }

    // Registered but undeclared.
    for (category, names) in registered {
        for name in names {
            let in_category = declared
                .get(category)
                .is_some_and(|d| d.iter().any(|n| n == name));
            let elsewhere = declared
                .iter()
                .any(|(c, d)| c != category && d.iter().any(|n| n == name));
            if !in_category && !elsewhere {
                results.extra_checks.push(format!("{category}.{name}"));
            }
        }
    }

    if !results.is_clean() {
        warn!(?results, "check registration drift detected");
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CheckRegistry, CheckSet};

    #[test]
    fn full_registration_validates_clean() {
        let mut registry = CheckRegistry::new();
        let mut set = CheckSet::new();
        checks::register_all(&mut registry, &mut set);

        let results = validate(&registry);
        assert!(results.is_clean(), "drift: {results:?}");
        assert_eq!(set.len(), discover().values().map(Vec::len).sum::<usize>());
    }

    #[test]
    fn empty_registry_reports_missing() {
        let registry = CheckRegistry::new();
        let results = validate(&registry);
        assert!(!results.missing_categories.is_empty());
        assert!(results
            .missing_checks
            .contains(&"headings.check_heading_structure".to_string()));
    }

    #[test]
    fn unregistered_extra_entry_reported() {
        let mut registry = CheckRegistry::new();
        let mut set = CheckSet::new();
        checks::register_all(&mut registry, &mut set);
        registry.add_if_absent("format", "check_nonexistent");

        let results = validate(&registry);
        assert_eq!(results.extra_checks, ["format.check_nonexistent"]);
    }

    #[test]
    fn cross_category_registration_is_not_missing() {
        let mut registry = CheckRegistry::new();
        // Registered under the wrong category: reported as extra there, but
        // not missing, matching the original validation semantics.
        registry.add_if_absent("format", "check_heading_structure");
        registry.add_if_absent("terminology", "check_required_language");
        registry.add_if_absent("format", "check_boilerplate");

        let results = validate(&registry);
        assert!(!results
            .missing_checks
            .iter()
            .any(|c| c.ends_with("check_heading_structure")));
        assert!(results.missing_categories.contains(&"headings".to_string()));
        assert!(results.extra_checks.is_empty());
    }
}
