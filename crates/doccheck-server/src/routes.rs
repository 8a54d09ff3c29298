//! HTTP surface: document processing, result downloads, upload preflight.
//!
//! Check execution for a request is synchronous; suspension points exist
//! only at the serving boundary (reading the body, cache file I/O). The
//! rate-limit gate is a plain boolean check before the handler body runs.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use doccheck_core::checks::{CheckContext, Paragraph};
use doccheck_core::pipeline;
use doccheck_core::registry::CheckSet;
use doccheck_core::{CheckRegistry, DocumentType, PatternCache, VisibilitySettings};

use crate::error::AppError;
use crate::export::{ExportFormat, Exporter};
use crate::rate_limit::RateLimiter;
use crate::result_cache::ResultCache;
use crate::security;

pub struct AppState {
    pub registry: CheckRegistry,
    pub checks: CheckSet,
    pub patterns: PatternCache,
    pub cache: ResultCache,
    pub limiter: RateLimiter,
    pub exporter: Box<dyn Exporter>,
    pub max_upload_bytes: usize,
}

/// Assemble the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/process", post(process_document))
        .route("/validate", post(validate_upload))
        .route("/results/{file}", get(download_result))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParagraphInput {
    Text(String),
    Styled {
        text: String,
        #[serde(default)]
        bold: bool,
        #[serde(default)]
        italic: bool,
    },
}

impl From<ParagraphInput> for Paragraph {
    fn from(input: ParagraphInput) -> Self {
        match input {
            ParagraphInput::Text(text) => Paragraph::plain(text),
            ParagraphInput::Styled { text, bold, italic } => Paragraph { text, bold, italic },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    doc_type: String,
    paragraphs: Vec<ParagraphInput>,
    /// Versioned visibility settings; accepts unversioned payloads and a
    /// JSON-encoded string form.
    #[serde(default)]
    visibility: Option<Value>,
    /// Where the document was fetched from, when it came from a URL.
    #[serde(default)]
    source_url: Option<String>,
}

fn client_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-client-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("default")
}

fn parse_visibility(value: Option<&Value>) -> Result<VisibilitySettings, AppError> {
    match value {
        None => Ok(VisibilitySettings::default()),
        Some(Value::String(s)) => Ok(VisibilitySettings::from_json_str(s)?),
        Some(v) => Ok(VisibilitySettings::from_value(v)?),
    }
}

async fn process_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<Value>, AppError> {
    if state.limiter.is_limited(client_id(&headers)) {
        return Err(AppError::RateLimited);
    }

    if let Some(url) = &request.source_url {
        security::validate_source_url(url)?;
    }

    let doc_type: DocumentType = request
        .doc_type
        .parse()
        .map_err(AppError::from)?;
    let visibility = parse_visibility(request.visibility.as_ref())?;

    let paragraphs: Vec<Paragraph> = request
        .paragraphs
        .into_iter()
        .map(Paragraph::from)
        .collect();
    let ctx = CheckContext {
        doc_type,
        paragraphs: &paragraphs,
        patterns: &state.patterns,
    };

    let outcome = pipeline::run_checks(&state.registry, &state.checks, &ctx, &visibility);
    let payload = outcome.to_value();
    let result_id = ResultCache::result_id(&payload);
    state.cache.save(&result_id, &payload).await?;

    info!(
        %doc_type,
        %result_id,
        has_errors = outcome.has_errors,
        checks_run = outcome.checks_run,
        "document processed"
    );

    let mut response = payload;
    response["result_id"] = json!(result_id);
    Ok(Json(response))
}

/// Preflight validation of a raw uploaded container, before any text
/// extraction happens elsewhere. Size and format problems surface here as
/// the same 4xx outcomes the processing path would produce.
async fn validate_upload(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    security::validate_document(&body, state.max_upload_bytes)?;
    Ok(Json(json!({"ok": true, "size": body.len()})))
}

async fn download_result(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let (id, ext) = file
        .rsplit_once('.')
        .ok_or_else(|| AppError::BadRequest("missing download extension".to_string()))?;
    let format = ExportFormat::from_extension(ext)?;

    let payload = state
        .cache
        .load(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("result not found: {id}")))?;
    let bytes = state.exporter.export(&payload, format)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.media_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::export::TextReportExporter;

    fn test_state(max_requests: usize) -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let patterns = PatternCache::from_value(
            &json!({
                "required_language": {
                    "order": [r"(?i)this order is effective"],
                }
            }),
            "test",
        )
        .unwrap();

        let mut registry = CheckRegistry::new();
        let mut checks = CheckSet::new();
        doccheck_core::checks::register_all(&mut registry, &mut checks);

        let cache = ResultCache::new(
            dir.path().to_path_buf(),
            Duration::from_secs(60),
            Duration::ZERO,
        )
        .unwrap();

        let state = Arc::new(AppState {
            registry,
            checks,
            patterns,
            cache,
            limiter: RateLimiter::new(max_requests, Duration::from_secs(60)),
            exporter: Box::new(TextReportExporter),
            max_upload_bytes: 1024 * 1024,
        });
        (dir, state)
    }

    fn process_request(body: &Value) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/process")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn process_returns_result_id_and_flags() {
        let (_dir, state) = test_state(0);
        let app = app(state);

        let body = json!({
            "doc_type": "order",
            "paragraphs": ["1. PURPOSE.", "2. BACKGROUND."],
        });
        let response = app.oneshot(process_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        assert_eq!(value["has_errors"], json!(true));
        assert_eq!(value["severity"], json!(0));
        assert!(value["result_id"].as_str().unwrap().len() == 64);
        assert!(value["by_category"]["terminology"]["issues"].is_array());
    }

    #[tokio::test]
    async fn unknown_doc_type_is_400() {
        let (_dir, state) = test_state(0);
        let app = app(state);

        let body = json!({"doc_type": "memo to self", "paragraphs": ["x"]});
        let response = app.oneshot(process_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value = body_json(response).await;
        assert_eq!(value["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unsupported_visibility_version_is_400() {
        let (_dir, state) = test_state(0);
        let app = app(state);

        let body = json!({
            "doc_type": "order",
            "paragraphs": ["x"],
            "visibility": {"version": 99},
        });
        let response = app.oneshot(process_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn hidden_category_respected_via_string_settings() {
        let (_dir, state) = test_state(0);
        let app = app(state);

        let body = json!({
            "doc_type": "order",
            "paragraphs": ["1. PURPOSE."],
            "visibility": "{\"terminology\": \"false\"}",
        });
        let response = app.oneshot(process_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["has_errors"], json!(false));
        assert!(value["by_category"].get("terminology").is_none());
    }

    #[tokio::test]
    async fn second_request_in_window_is_429() {
        let (_dir, state) = test_state(1);

        let body = json!({"doc_type": "order", "paragraphs": ["x"]});
        let first = app(Arc::clone(&state))
            .oneshot(process_request(&body))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app(state).oneshot(process_request(&body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        let value = body_json(second).await;
        assert_eq!(value["error"]["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn disallowed_source_domain_is_400() {
        let (_dir, state) = test_state(0);
        let app = app(state);

        let body = json!({
            "doc_type": "order",
            "paragraphs": ["x"],
            "source_url": "https://example.com/doc.docx",
        });
        let response = app.oneshot(process_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_round_trip() {
        let (_dir, state) = test_state(0);

        let body = json!({"doc_type": "order", "paragraphs": ["1. PURPOSE."]});
        let response = app(Arc::clone(&state))
            .oneshot(process_request(&body))
            .await
            .unwrap();
        let value = body_json(response).await;
        let result_id = value["result_id"].as_str().unwrap().to_string();

        let request = axum::http::Request::builder()
            .uri(format!("/results/{result_id}.pdf"))
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn unknown_result_id_is_404() {
        let (_dir, state) = test_state(0);
        let request = axum::http::Request::builder()
            .uri("/results/feedfacefeedface.pdf")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_extension_is_400() {
        let (_dir, state) = test_state(0);
        let request = axum::http::Request::builder()
            .uri("/results/abc123.html")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validate_rejects_legacy_container() {
        let (_dir, state) = test_state(0);
        let legacy: Vec<u8> = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0x00];
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/validate")
            .body(axum::body::Body::from(legacy))
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validate_accepts_docx_container() {
        let (_dir, state) = test_state(0);
        let docx: Vec<u8> = vec![0x50, 0x4B, 0x03, 0x04, 0x00, 0x01];
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/validate")
            .body(axum::body::Body::from(docx))
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_dir, state) = test_state(0);
        let request = axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
