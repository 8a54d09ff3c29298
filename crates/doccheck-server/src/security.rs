//! Request-level security validation.
//!
//! Validation failures surface as distinct 4xx outcomes, never silently
//! ignored: oversized content is 413, disallowed or legacy formats and
//! non-allowlisted source domains are 400.

use crate::error::AppError;

/// Magic bytes of an OLE compound file, the legacy binary `.doc` container.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Magic bytes of a ZIP archive; modern `.docx` containers start with this.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Validate a raw uploaded document: size cap, then container format.
/// Only modern ZIP-based containers are accepted; the legacy OLE format is
/// rejected explicitly so the caller gets an actionable message.
pub fn validate_document(bytes: &[u8], max_bytes: usize) -> Result<(), AppError> {
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "document exceeds maximum allowed size of {} bytes",
            max_bytes
        )));
    }
    if bytes.len() >= OLE_MAGIC.len() && bytes[..OLE_MAGIC.len()] == OLE_MAGIC {
        return Err(AppError::BadRequest(
            "legacy .doc format is not supported; convert to .docx".to_string(),
        ));
    }
    if bytes.len() < ZIP_MAGIC.len() || bytes[..ZIP_MAGIC.len()] != ZIP_MAGIC {
        return Err(AppError::BadRequest(
            "unrecognized document format; only .docx is accepted".to_string(),
        ));
    }
    Ok(())
}

/// Validate a document source URL against the domain allowlist. Only https
/// URLs on government domains may be fetched.
pub fn validate_source_url(url: &str) -> Result<(), AppError> {
    let rest = url
        .strip_prefix("https://")
        .ok_or_else(|| AppError::BadRequest("source url must use https".to_string()))?;
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .split('@')
        .next_back()
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("");
    if host.is_empty() {
        return Err(AppError::BadRequest("source url has no host".to_string()));
    }
    let allowed = host.ends_with(".gov") || host == "gov";
    if !allowed {
        return Err(AppError::BadRequest(format!(
            "source domain not allowed: {host}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docx_bytes() -> Vec<u8> {
        let mut bytes = ZIP_MAGIC.to_vec();
        bytes.extend_from_slice(b"rest of archive");
        bytes
    }

    #[test]
    fn accepts_zip_container_under_cap() {
        assert!(validate_document(&docx_bytes(), 1024).is_ok());
    }

    #[test]
    fn oversized_document_rejected() {
        let err = validate_document(&docx_bytes(), 4).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn legacy_ole_container_rejected() {
        let mut bytes = OLE_MAGIC.to_vec();
        bytes.extend_from_slice(b"legacy doc");
        let err = validate_document(&bytes, 1024).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_container_rejected() {
        let err = validate_document(b"plain text", 1024).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn source_url_allowlist() {
        assert!(validate_source_url("https://www.faa.gov/doc.docx").is_ok());
        assert!(validate_source_url("https://example.com/doc.docx").is_err());
        assert!(validate_source_url("http://www.faa.gov/doc.docx").is_err());
        assert!(validate_source_url("https://evil.com@good.gov.example.com/x").is_err());
    }
}
