/// Heading checks: the structural walk over numbered heading sequences.
use crate::error::CoreError;
use crate::models::DocumentCheckResult;
use crate::registry::{CheckRegistry, CheckSet};
use crate::structure;

use super::{CheckContext, CheckDeclaration};

const CATEGORY: &str = "headings";

pub fn declarations() -> Vec<CheckDeclaration> {
    vec![CheckDeclaration {
        category: CATEGORY,
        name: "check_heading_structure",
    }]
}

pub fn register(registry: &mut CheckRegistry, set: &mut CheckSet) {
    registry.add_if_absent(CATEGORY, "check_heading_structure");
    set.insert("check_heading_structure", check_heading_structure);
}

/// Validate the document's heading numbering sequence.
pub fn check_heading_structure(ctx: &CheckContext) -> Result<DocumentCheckResult, CoreError> {
    let mut result = DocumentCheckResult::named("check_heading_structure");
    for issue in structure::validate_heading_sequence(ctx.lines()) {
        result.add_issue(issue);
    }
    Ok(result)
}
