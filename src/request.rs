//! Generation requests and uploaded documents.

use crate::artifact::ArtifactKind;
use crate::error::FlashgenError;
use std::fmt;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// One call to [`crate::generate::Generator::generate`].
///
/// When both `upload` and `source_text` are set the upload wins.
#[derive(Debug)]
pub struct GenerationRequest {
    pub source_text: Option<String>,
    pub upload: Option<Upload>,
    pub kind: ArtifactKind,
}

impl GenerationRequest {
    /// Request generation from raw text.
    pub fn from_text(kind: ArtifactKind, text: impl Into<String>) -> Self {
        Self {
            source_text: Some(text.into()),
            upload: None,
            kind,
        }
    }

    /// Request generation from an uploaded document.
    pub fn from_upload(kind: ArtifactKind, upload: Upload) -> Self {
        Self {
            source_text: None,
            upload: Some(upload),
            kind,
        }
    }
}

/// Where an upload's bytes live.
pub enum UploadBody {
    /// Already in memory.
    Memory(Vec<u8>),
    /// Spooled to a temporary file by the upload layer. The file is deleted as
    /// soon as it has been read, whatever happens afterwards.
    Spooled(NamedTempFile),
}

impl fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadBody::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            UploadBody::Spooled(file) => write!(f, "Spooled({})", file.path().display()),
        }
    }
}

/// An uploaded document and its declared media type.
#[derive(Debug)]
pub struct Upload {
    pub body: UploadBody,
    pub media_type: String,
}

impl Upload {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            body: UploadBody::Memory(bytes.into()),
            media_type: media_type.into(),
        }
    }

    pub fn from_temp_file(file: NamedTempFile, media_type: impl Into<String>) -> Self {
        Self {
            body: UploadBody::Spooled(file),
            media_type: media_type.into(),
        }
    }

    /// Load the bytes, releasing any temporary file.
    ///
    /// The temporary file is deleted whether or not the read succeeded; a
    /// failed deletion is logged, not returned, because the content is
    /// already in hand.
    pub async fn into_bytes(self) -> Result<(Vec<u8>, String), FlashgenError> {
        let Upload { body, media_type } = self;
        let bytes = match body {
            UploadBody::Memory(bytes) => bytes,
            UploadBody::Spooled(file) => {
                let temp_path = file.into_temp_path();
                let read = tokio::fs::read(&temp_path).await;
                let shown = temp_path.display().to_string();
                match temp_path.close() {
                    Ok(()) => debug!("Removed spooled upload {}", shown),
                    Err(e) => warn!("Failed to remove spooled upload {}: {}", shown, e),
                }
                read.map_err(|e| FlashgenError::Internal(format!("Failed to read upload: {e}")))?
            }
        };
        Ok((bytes, media_type))
    }
}
