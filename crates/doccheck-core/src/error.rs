/// Error types shared across the document check crates.
///
/// These cover failures in the core engine (pattern compilation, pattern
/// registry loading, serialization versioning). The server crate defines its
/// own `AppError` for HTTP concerns and wraps `CoreError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid regex pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to load pattern registry from {path}: {message}")]
    PatternConfig { path: String, message: String },

    #[error("unsupported serialization version: {0}")]
    UnsupportedVersion(u32),

    #[error("unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("check '{check}' failed: {message}")]
    CheckFailed { check: String, message: String },
}
