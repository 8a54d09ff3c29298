//! Export seam for result downloads.
//!
//! Producing real DOCX/PDF output is an external collaborator; the serving
//! layer only decides the format from the requested extension and hands the
//! stored payload to an `Exporter`. The built-in implementation emits the
//! plain-text report with the right media type, which is what the tests and
//! the default deployment use.

use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    /// Parse a download extension. Unsupported extensions are a client
    /// error, distinct from an unknown result id.
    pub fn from_extension(ext: &str) -> Result<Self, AppError> {
        match ext {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(AppError::BadRequest(format!(
                "unsupported download format: {other}"
            ))),
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Docx => "results.docx",
            Self::Pdf => "results.pdf",
        }
    }
}

/// Renders a stored result payload into download bytes.
pub trait Exporter: Send + Sync {
    fn export(&self, payload: &Value, format: ExportFormat) -> Result<Vec<u8>, AppError>;
}

/// Default exporter: the canonical text report from the payload, falling
/// back to pretty-printed JSON when no rendered form is present.
pub struct TextReportExporter;

impl Exporter for TextReportExporter {
    fn export(&self, payload: &Value, _format: ExportFormat) -> Result<Vec<u8>, AppError> {
        let text = match payload.get("rendered").and_then(Value::as_str) {
            Some(rendered) if !rendered.is_empty() => rendered.to_string(),
            _ => serde_json::to_string_pretty(payload)
                .map_err(|e| AppError::Internal(e.to_string()))?,
        };
        Ok(text.into_bytes())
    }
}
