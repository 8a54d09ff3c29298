/// Check modules and the contracts they share.
///
/// Each module declares its checks (`declarations`) and registers them into
/// a passed-in registry + function table (`register`). Declaration and
/// registration are deliberately separate: `discovery::validate` diffs the
/// two to catch drift, the compile-time replacement for the original
/// reflection scan.
pub mod format;
pub mod headings;
pub mod terminology;

use crate::error::CoreError;
use crate::models::{DocumentCheckResult, DocumentType};
use crate::pattern_cache::PatternCache;
use crate::registry::{CheckRegistry, CheckSet};

/// A paragraph handed over by the external document reader: text plus the
/// run-level style flags checks may consult. The core never parses the
/// binary container itself.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Input to a single check invocation.
pub struct CheckContext<'a> {
    pub doc_type: DocumentType,
    pub paragraphs: &'a [Paragraph],
    pub patterns: &'a PatternCache,
}

impl CheckContext<'_> {
    /// Ordered paragraph texts, the view most checks work on.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.paragraphs.iter().map(|p| p.text.as_str())
    }
}

pub type CheckFn = fn(&CheckContext) -> Result<DocumentCheckResult, CoreError>;

/// A check as declared by its module, independent of registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckDeclaration {
    pub category: &'static str,
    pub name: &'static str,
}

/// The fixed list of check modules, as (module name, declarations).
/// Discovery walks this instead of scanning code.
pub fn modules() -> Vec<(&'static str, Vec<CheckDeclaration>)> {
    vec![
        ("headings", headings::declarations()),
        ("terminology", terminology::declarations()),
        ("format", format::declarations()),
    ]
}

/// Register every check module into the registry and function table.
pub fn register_all(registry: &mut CheckRegistry, set: &mut CheckSet) {
    headings::register(registry, set);
    terminology::register(registry, set);
    format::register(registry, set);
}
