/// Format checks driven by the boilerplate pattern registry.
use crate::error::CoreError;
use crate::models::{DocumentCheckResult, Issue, Severity};
use crate::registry::{CheckRegistry, CheckSet};

use super::{CheckContext, CheckDeclaration};

const CATEGORY: &str = "format";

pub fn declarations() -> Vec<CheckDeclaration> {
    vec![CheckDeclaration {
        category: CATEGORY,
        name: "check_boilerplate",
    }]
}

pub fn register(registry: &mut CheckRegistry, set: &mut CheckSet) {
    registry.add_if_absent(CATEGORY, "check_boilerplate");
    set.insert("check_boilerplate", check_boilerplate);
}

/// Flag standard boilerplate blocks for the document type that are absent
/// from the document. Boilerplate is advisory, so absences are warnings
/// rather than errors.
pub fn check_boilerplate(ctx: &CheckContext) -> Result<DocumentCheckResult, CoreError> {
    let mut result = DocumentCheckResult::named("check_boilerplate");
    let patterns = ctx.patterns.boilerplate_patterns(ctx.doc_type.as_key())?;

    for pattern in patterns {
        let found = ctx.lines().any(|line| pattern.is_match(line));
        if !found {
            result.add_issue(
                Issue::new(
                    format!("Standard boilerplate for {} documents not found", ctx.doc_type),
                    Severity::Warning,
                )
                .with_suggestion("Include the standard boilerplate paragraph")
                .with_category(CATEGORY)
                .with_extra("pattern", serde_json::json!(pattern.as_str())),
            );
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Paragraph;
    use crate::models::DocumentType;
    use crate::pattern_cache::PatternCache;
    use serde_json::json;

    #[test]
    fn missing_boilerplate_is_a_warning() {
        let data = json!({
            "boilerplate": {
                "advisory_circular": [r"(?i)paperwork reduction act"],
            }
        });
        let patterns = PatternCache::from_value(&data, "test").unwrap();
        let paragraphs = [Paragraph::plain("1. PURPOSE.")];
        let ctx = CheckContext {
            doc_type: DocumentType::AdvisoryCircular,
            paragraphs: &paragraphs,
            patterns: &patterns,
        };
        let result = check_boilerplate(&ctx).unwrap();
        assert!(!result.success);
        assert_eq!(result.severity, Some(Severity::Warning));
    }
}
