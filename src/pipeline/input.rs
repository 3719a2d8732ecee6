//! Input resolution: turn a user-supplied path or URL into an [`Upload`].
//!
//! Local files are read straight into memory. Remote documents are downloaded
//! in one buffered read, written to a [`NamedTempFile`] and handed over as a spooled upload, so the
//! generator's "delete once read" rule covers them like any multipart upload
//! a server would spool to disk.

use crate::error::FlashgenError;
use crate::pipeline::extract::media_type_for_path;
use crate::request::Upload;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Media type used when nothing better is known; always rejected by the
/// default extractor.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to an upload.
///
/// `media_type` overrides detection from the extension / `Content-Type`.
pub async fn resolve_upload(
    input: &str,
    media_type: Option<&str>,
    max_bytes: usize,
    timeout_secs: u64,
) -> Result<Upload, FlashgenError> {
    if is_url(input) {
        download_url(input, media_type, max_bytes, timeout_secs).await
    } else {
        read_local(input, media_type, max_bytes).await
    }
}

/// Read a local file, checking existence and the size limit first.
async fn read_local(
    path_str: &str,
    media_type: Option<&str>,
    max_bytes: usize,
) -> Result<Upload, FlashgenError> {
    let path = PathBuf::from(path_str);

    let meta = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => FlashgenError::InvalidInput {
            reason: format!("permission denied reading '{}'", path.display()),
        },
        _ => FlashgenError::InvalidInput {
            reason: format!("file not found: '{}'", path.display()),
        },
    })?;

    let size = meta.len() as usize;
    if size > max_bytes {
        return Err(FlashgenError::UploadTooLarge {
            size,
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| FlashgenError::Internal(format!("Failed to read '{}': {}", path.display(), e)))?;

    let media_type = media_type
        .map(str::to_string)
        .unwrap_or_else(|| detect_media_type(&path, None));
    debug!("Resolved local upload: {} ({})", path.display(), media_type);
    Ok(Upload::from_bytes(bytes, media_type))
}

/// Download a URL into a temporary file.
async fn download_url(
    url: &str,
    media_type: Option<&str>,
    max_bytes: usize,
    timeout_secs: u64,
) -> Result<Upload, FlashgenError> {
    info!("Downloading document from: {}", url);

    let failed = |reason: String| FlashgenError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {}s", timeout_secs))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    if let Some(len) = response.content_length() {
        if len as usize > max_bytes {
            return Err(FlashgenError::UploadTooLarge {
                size: len as usize,
                limit: max_bytes,
            });
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(FlashgenError::UploadTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let mut file = NamedTempFile::new()
        .map_err(|e| FlashgenError::Internal(format!("tempfile: {e}")))?;
    file.write_all(&bytes)
        .map_err(|e| FlashgenError::Internal(format!("tempfile write: {e}")))?;

    let media_type = media_type.map(str::to_string).unwrap_or_else(|| {
        detect_media_type(Path::new(url_path(url)), content_type.as_deref())
    });
    info!(
        "Downloaded {} bytes to {} ({})",
        bytes.len(),
        file.path().display(),
        media_type
    );

    Ok(Upload::from_temp_file(file, media_type))
}

/// Prefer a recognised `Content-Type`, then the file extension, then the raw
/// header, then [`UNKNOWN_MEDIA_TYPE`].
fn detect_media_type(path: &Path, content_type: Option<&str>) -> String {
    let header = content_type.map(|ct| ct.split(';').next().unwrap_or_default().trim());
    if let Some(ct) = header {
        if crate::pipeline::extract::DocumentFormat::from_media_type(ct).is_some() {
            return ct.to_string();
        }
    }
    if let Some(mt) = media_type_for_path(path) {
        return mt.to_string();
    }
    header
        .filter(|ct| !ct.is_empty())
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
        .to_string()
}

/// Path component of a URL, without query or fragment.
fn url_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let end = without_scheme
        .find(['?', '#'])
        .unwrap_or(without_scheme.len());
    &without_scheme[..end]
}
