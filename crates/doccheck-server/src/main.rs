mod config;
mod error;
mod export;
mod rate_limit;
mod result_cache;
mod routes;
mod security;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use doccheck_core::registry::CheckSet;
use doccheck_core::{discovery, CheckRegistry, PatternCache};

use config::Config;
use export::TextReportExporter;
use rate_limit::RateLimiter;
use result_cache::ResultCache;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting doccheck server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        patterns = %config.patterns_path.display(),
        results_dir = %config.results_dir.display(),
        bind = %config.bind_addr,
        "configuration loaded"
    );

    // 2. Load and compile the pattern registry (fatal on error)
    let patterns = PatternCache::from_file(&config.patterns_path)?;

    // 3. Register checks and verify the registry against the declarations
    let mut registry = CheckRegistry::new();
    let mut checks = CheckSet::new();
    doccheck_core::checks::register_all(&mut registry, &mut checks);

    let validation = discovery::validate(&registry);
    if validation.is_clean() {
        info!(checks = checks.len(), "check registry validated");
    } else {
        warn!(
            missing_categories = ?validation.missing_categories,
            missing_checks = ?validation.missing_checks,
            extra_checks = ?validation.extra_checks,
            "check registry drift detected"
        );
    }

    // 4. Result cache and rate limiter
    let cache = ResultCache::new(
        config.results_dir.clone(),
        config.result_ttl,
        config.cleanup_interval,
    )?;
    let limiter = RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window);

    let state = Arc::new(AppState {
        registry,
        checks,
        patterns,
        cache,
        limiter,
        exporter: Box::new(TextReportExporter),
        max_upload_bytes: config.max_upload_bytes,
    });

    // 5. Serve
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
