/// Check-run pipeline: executes registered checks against a document and
/// merges their results into a per-category aggregate.
///
/// Execution is synchronous and single-pass. One check's failure never
/// aborts the rest of the run; it is recorded as a partial failure on the
/// owning category's merged result.
use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::{debug, error};

use crate::checks::CheckContext;
use crate::models::{DocumentCheckResult, Severity, VisibilitySettings};
use crate::registry::{CheckRegistry, CheckSet};

/// Aggregate outcome of one check run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRunOutcome {
    pub has_errors: bool,
    pub severity: Option<Severity>,
    pub by_category: BTreeMap<String, DocumentCheckResult>,
    pub rendered: String,
    pub checks_run: usize,
}

impl CheckRunOutcome {
    /// The serialized payload stored in the result cache and returned from
    /// the processing endpoint (minus the result id, added by the server).
    pub fn to_value(&self) -> Value {
        let mut by_category = Map::new();
        for (category, result) in &self.by_category {
            by_category.insert(category.clone(), result.to_value());
        }
        let issue_count: usize = self.by_category.values().map(|r| r.issues.len()).sum();
        json!({
            "has_errors": self.has_errors,
            "severity": self.severity.map(Severity::ordinal),
            "rendered": self.rendered,
            "by_category": Value::Object(by_category),
            "metadata": {
                "checks_run": self.checks_run,
                "issue_count": issue_count,
            },
        })
    }
}

/// Merge several check results into one, without mutating the inputs.
/// Success holds only when every input succeeded; the aggregate severity is
/// the most severe seen; the score is the most conservative.
pub fn merge_results(
    category: &str,
    results: &[DocumentCheckResult],
) -> DocumentCheckResult {
    let mut merged = DocumentCheckResult::named(category);
    for result in results {
        merged.success &= result.success;
        merged.issues.extend(result.issues.iter().cloned());
        merged
            .partial_failures
            .extend(result.partial_failures.iter().cloned());
        if let Some(severity) = result.severity {
            if merged.severity.is_none_or(|current| severity < current) {
                merged.severity = Some(severity);
            }
        }
        if result.score < merged.score {
            merged.score = result.score;
        }
    }
    merged
}

/// Run every registered check whose category is visible.
pub fn run_checks(
    registry: &CheckRegistry,
    set: &CheckSet,
    ctx: &CheckContext,
    visibility: &VisibilitySettings,
) -> CheckRunOutcome {
    let mut by_category = BTreeMap::new();
    let mut checks_run = 0;

    for (category, names) in registry.category_mappings() {
        if !visibility.is_visible(category) {
            debug!(category, "category hidden, skipping");
            continue;
        }

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for name in names {
            let Some(check) = set.get(name) else {
                error!(check = %name, category, "registered check has no implementation");
                failures.push(json!({
                    "check": name,
                    "category": category,
                    "error": "registered check has no implementation",
                }));
                continue;
            };
            checks_run += 1;
            match check(ctx) {
                Ok(result) => results.push(result),
                Err(e) => {
                    // Isolated: the remaining checks still run.
                    error!(check = %name, category, error = %e, "check failed");
                    failures.push(json!({
                        "check": name,
                        "category": category,
                        "error": e.to_string(),
                    }));
                }
            }
        }

        let mut merged = merge_results(category, &results);
        merged.partial_failures.extend(failures);
        by_category.insert(category.clone(), merged);
    }

    let severity = by_category
        .values()
        .filter_map(|r| r.severity)
        .min();
    let has_errors = severity == Some(Severity::Error);
    let rendered = render_report(&by_category);

    CheckRunOutcome {
        has_errors,
        severity,
        by_category,
        rendered,
        checks_run,
    }
}

/// Plain-text report grouped by category. Rendering to richer formats is an
/// external concern; this is the canonical text form embedded in responses.
fn render_report(by_category: &BTreeMap<String, DocumentCheckResult>) -> String {
    let mut out = String::new();
    for (category, result) in by_category {
        if result.issues.is_empty() && result.partial_failures.is_empty() {
            continue;
        }
        out.push_str(&format!("[{category}]\n"));
        for issue in &result.issues {
            out.push_str(&format!("  {}: {}", issue.severity, issue.message));
            if let Some(line) = issue.line_number {
                out.push_str(&format!(" (line {line})"));
            }
            if let Some(suggestion) = &issue.suggestion {
                out.push_str(&format!(" -- {suggestion}"));
            }
            out.push('\n');
        }
        for failure in &result.partial_failures {
            let check = failure.get("check").and_then(Value::as_str).unwrap_or("?");
            let msg = failure.get("error").and_then(Value::as_str).unwrap_or("?");
            out.push_str(&format!("  check failed: {check}: {msg}\n"));
        }
    }
    if out.is_empty() {
        out.push_str("No issues found.\n");
    }
    out
}
