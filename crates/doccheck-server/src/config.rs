use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Server configuration loaded explicitly from environment variables.
///
/// The pattern-registry path is required and validated at startup; a missing
/// or malformed registry is a fatal startup error, not a per-request one.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON pattern registry (required).
    pub patterns_path: PathBuf,
    /// Directory for on-disk result cache files.
    pub results_dir: PathBuf,
    /// Retention for cached results.
    pub result_ttl: Duration,
    /// Minimum spacing between disk cleanup sweeps.
    pub cleanup_interval: Duration,
    /// Rate-limit window size.
    pub rate_limit_window: Duration,
    /// Maximum requests per client per window. Zero disables limiting.
    pub rate_limit_max_requests: usize,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// Bind address for the HTTP listener.
    pub bind_addr: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DOCCHECK_PATTERNS_PATH`: path to the pattern registry JSON
    ///
    /// Optional (with defaults):
    /// - `DOCCHECK_RESULTS_DIR` (default: `<tmp>/doccheck_results`)
    /// - `RESULT_TTL` seconds (default: 3600)
    /// - `RESULT_CLEANUP_INTERVAL` seconds (default: 60)
    /// - `RATE_LIMIT_WINDOW` seconds (default: 60)
    /// - `RATE_LIMIT_MAX_REQUESTS` (default: 10, 0 disables)
    /// - `DOCCHECK_MAX_UPLOAD_BYTES` (default: 5 MiB)
    /// - `DOCCHECK_BIND` (default: "127.0.0.1:8080")
    pub fn from_env() -> Result<Self, AppError> {
        let patterns_path = std::env::var("DOCCHECK_PATTERNS_PATH").map_err(|_| {
            AppError::Internal(
                "DOCCHECK_PATTERNS_PATH environment variable is required".to_string(),
            )
        })?;
        let patterns_path = PathBuf::from(patterns_path);
        if !patterns_path.exists() {
            return Err(AppError::Internal(format!(
                "pattern registry not found at {}",
                patterns_path.display()
            )));
        }

        let results_dir = std::env::var("DOCCHECK_RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("doccheck_results"));

        Ok(Self {
            patterns_path,
            results_dir,
            result_ttl: Duration::from_secs(env_u64("RESULT_TTL", 3600)),
            cleanup_interval: Duration::from_secs(env_u64("RESULT_CLEANUP_INTERVAL", 60)),
            rate_limit_window: Duration::from_secs(env_u64("RATE_LIMIT_WINDOW", 60)),
            rate_limit_max_requests: env_u64("RATE_LIMIT_MAX_REQUESTS", 10) as usize,
            max_upload_bytes: env_u64("DOCCHECK_MAX_UPLOAD_BYTES", 5 * 1024 * 1024) as usize,
            bind_addr: std::env::var("DOCCHECK_BIND")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
        })
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
