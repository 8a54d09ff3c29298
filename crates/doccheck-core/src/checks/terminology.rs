/// Terminology checks driven by the required-language pattern registry.
use crate::error::CoreError;
use crate::models::{DocumentCheckResult, Issue, Severity};
use crate::registry::{CheckRegistry, CheckSet};

use super::{CheckContext, CheckDeclaration};

const CATEGORY: &str = "terminology";

pub fn declarations() -> Vec<CheckDeclaration> {
    vec![CheckDeclaration {
        category: CATEGORY,
        name: "check_required_language",
    }]
}

pub fn register(registry: &mut CheckRegistry, set: &mut CheckSet) {
    registry.add_if_absent(CATEGORY, "check_required_language");
    set.insert("check_required_language", check_required_language);
}

/// Flag required-language patterns for the document type that match nowhere
/// in the document. A document type with no configured patterns passes.
pub fn check_required_language(ctx: &CheckContext) -> Result<DocumentCheckResult, CoreError> {
    let mut result = DocumentCheckResult::named("check_required_language");
    let patterns = ctx
        .patterns
        .required_language_patterns(ctx.doc_type.as_key())?;

    for pattern in patterns {
        let found = ctx.lines().any(|line| pattern.is_match(line));
        if !found {
            result.add_issue(
                Issue::new(
                    format!(
                        "Required language for {} documents not found",
                        ctx.doc_type
                    ),
                    Severity::Error,
                )
                .with_suggestion("Insert the standard required language for this document type")
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

    fn patterns() -> PatternCache {
        let data = json!({
            "required_language": {
                "order": [r"(?i)this order is effective on"],
            }
        });
        PatternCache::from_value(&data, "test").unwrap()
    }

    #[test]
    fn missing_required_language_is_an_error() {
        let paragraphs = [Paragraph::plain("1. PURPOSE.")];
        let patterns = patterns();
        let ctx = CheckContext {
            doc_type: DocumentType::Order,
            paragraphs: &paragraphs,
            patterns: &patterns,
        };
        let result = check_required_language(&ctx).unwrap();
        assert!(!result.success);
        assert_eq!(result.severity, Some(Severity::Error));
    }

    #[test]
    fn present_required_language_passes() {
        let paragraphs = [Paragraph::plain("This Order is effective on June 1, 2026.")];
        let patterns = patterns();
        let ctx = CheckContext {
            doc_type: DocumentType::Order,
            paragraphs: &paragraphs,
            patterns: &patterns,
        };
        assert!(check_required_language(&ctx).unwrap().success);
    }

    #[test]
    fn unconfigured_document_type_passes() {
        let paragraphs = [Paragraph::plain("Anything at all.")];
        let patterns = patterns();
        let ctx = CheckContext {
            doc_type: DocumentType::Rule,
            paragraphs: &paragraphs,
            patterns: &patterns,
        };
        assert!(check_required_language(&ctx).unwrap().success);
    }
}
