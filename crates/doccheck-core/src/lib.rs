pub mod checks;
pub mod discovery;
pub mod error;
pub mod models;
pub mod pattern_cache;
pub mod pipeline;
pub mod registry;
pub mod structure;

pub use error::CoreError;
pub use models::{
    DocumentCheckResult, DocumentType, Issue, Severity, VisibilitySettings,
};
pub use pattern_cache::PatternCache;
pub use registry::CheckRegistry;
