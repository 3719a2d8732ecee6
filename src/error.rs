//! Error types for the flashgen library.
//!
//! Three error types map to the three places a request can fail:
//!
//! * [`FlashgenError`] — the terminal error of a generation request. Every
//!   variant classifies into an [`ErrorKind`], which in turn decides the HTTP
//!   status and the caller-visible message at the boundary
//!   (see [`crate::response`]).
//!
//! * [`ExtractError`] — returned by a [`crate::pipeline::extract::ContentExtractor`]
//!   when an uploaded document cannot be turned into text.
//!
//! * [`CompletionError`] — returned by a
//!   [`crate::pipeline::completion::CompletionClient`] on transport, auth or
//!   quota failures. These are never retried by the library.
//!
//! Diagnostic detail (raw model output, provider messages) is carried in the
//! `Display` text for logs only; [`FlashgenError::public_message`] is the only
//! text a caller ever sees.

use crate::artifact::ArtifactKind;
use crate::pipeline::validate::Violation;
use thiserror::Error;

/// Coarse classification of a failed generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Caller-fixable: missing, too-short or oversized content.
    InvalidInput,
    /// Uploaded document has a media type we cannot extract text from.
    UnsupportedFormat,
    /// The completion API failed (transport, auth, quota, timeout).
    UpstreamUnavailable,
    /// The model output could not be parsed as JSON, even after the retry.
    MalformedModelOutput,
    /// The model output parsed but does not match the requested shape.
    SchemaViolation,
    /// Anything else: extraction crashes, misconfiguration, bugs.
    Internal,
}

impl ErrorKind {
    /// HTTP status code reported for this kind at the `POST /generate` boundary.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidInput | ErrorKind::UnsupportedFormat => 400,
            ErrorKind::MalformedModelOutput | ErrorKind::SchemaViolation => 502,
            ErrorKind::UpstreamUnavailable | ErrorKind::Internal => 500,
        }
    }
}

/// All terminal errors of a generation request.
#[derive(Debug, Error)]
pub enum FlashgenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No content, or content shorter than the configured minimum.
    #[error("Insufficient input content: {reason}")]
    InvalidInput { reason: String },

    /// Upload exceeds the configured size limit.
    #[error("Upload of {size} bytes exceeds the {limit}-byte limit")]
    UploadTooLarge { size: usize, limit: usize },

    /// Declared media type is not a PDF or Word document.
    #[error("Unsupported file type '{media_type}'")]
    UnsupportedFormat { media_type: String },

    /// The document was accepted but its text could not be extracted.
    #[error("Failed to extract text from '{media_type}' upload: {detail}")]
    ExtractionFailed { media_type: String, detail: String },

    /// A remote document could not be fetched.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The completion client failed; not retried at this layer.
    #[error("Completion API unavailable: {0}")]
    UpstreamUnavailable(#[from] CompletionError),

    /// Neither the first response nor the retry contained parseable JSON.
    #[error("Model returned invalid JSON after {attempts} attempts")]
    MalformedModelOutput { attempts: u32 },

    /// Parsed JSON does not match the requested artifact shape.
    #[error("Invalid {} shape: {}", .kind.payload_field(), format_violations(.violations))]
    SchemaViolation {
        kind: ArtifactKind,
        violations: Vec<Violation>,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlashgenError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlashgenError::InvalidInput { .. } | FlashgenError::UploadTooLarge { .. } => {
                ErrorKind::InvalidInput
            }
            FlashgenError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            FlashgenError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            FlashgenError::MalformedModelOutput { .. } => ErrorKind::MalformedModelOutput,
            FlashgenError::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            FlashgenError::ExtractionFailed { .. }
            | FlashgenError::DownloadFailed { .. }
            | FlashgenError::ProviderNotConfigured { .. }
            | FlashgenError::InvalidConfig(_)
            | FlashgenError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// The message returned to the caller. Never includes model output.
    pub fn public_message(&self) -> &'static str {
        match self {
            FlashgenError::SchemaViolation { kind, .. } => match kind {
                ArtifactKind::Flashcards => "Invalid flashcards shape",
                ArtifactKind::Quiz => "Invalid questions shape",
            },
            other => match other.kind() {
                ErrorKind::InvalidInput | ErrorKind::UnsupportedFormat => {
                    "Insufficient input content"
                }
                ErrorKind::MalformedModelOutput => "Model returned invalid JSON",
                _ => "Failed to generate content",
            },
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    match violations {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

/// Failure to turn an uploaded document into text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// Media type is not one we can extract.
    #[error("Unsupported file type '{0}'")]
    UnsupportedFormat(String),

    /// The pdfium library could not be loaded.
    #[error("PDF engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The document bytes could not be parsed.
    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Failure of a single completion call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// Transport-level or provider API error.
    #[error("{0}")]
    Api(String),

    /// The call did not finish within the configured timeout.
    #[error("completion timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl From<ExtractError> for FlashgenError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(media_type) => {
                FlashgenError::UnsupportedFormat { media_type }
            }
            ExtractError::EngineUnavailable(detail) => FlashgenError::Internal(detail),
            ExtractError::Corrupt(detail) => FlashgenError::ExtractionFailed {
                media_type: "document".to_string(),
                detail,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_kind() {
        let e = FlashgenError::InvalidInput {
            reason: "too short".into(),
        };
        assert_eq!(e.status_code(), 400);
        assert_eq!(e.public_message(), "Insufficient input content");

        let e = FlashgenError::UnsupportedFormat {
            media_type: "image/png".into(),
        };
        assert_eq!(e.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(e.status_code(), 400);

        let e = FlashgenError::MalformedModelOutput { attempts: 2 };
        assert_eq!(e.status_code(), 502);
        assert_eq!(e.public_message(), "Model returned invalid JSON");

        let e = FlashgenError::UpstreamUnavailable(CompletionError::Api("quota".into()));
        assert_eq!(e.status_code(), 500);
        assert_eq!(e.public_message(), "Failed to generate content");
    }

    #[test]
    fn schema_violation_message_depends_on_kind() {
        let e = FlashgenError::SchemaViolation {
            kind: ArtifactKind::Flashcards,
            violations: vec![],
        };
        assert_eq!(e.public_message(), "Invalid flashcards shape");
        assert_eq!(e.status_code(), 502);

        let e = FlashgenError::SchemaViolation {
            kind: ArtifactKind::Quiz,
            violations: vec![],
        };
        assert_eq!(e.public_message(), "Invalid questions shape");
    }

    #[test]
    fn schema_violation_display_summarises() {
        let e = FlashgenError::SchemaViolation {
            kind: ArtifactKind::Quiz,
            violations: vec![
                Violation::new("questions[0].answerIndex", "must be in 0..=3"),
                Violation::new("questions[1].choices", "expected 4 items, got 3"),
            ],
        };
        let msg = e.to_string();
        assert!(msg.contains("questions[0].answerIndex"), "got: {msg}");
        assert!(msg.contains("1 more"), "got: {msg}");
    }

    #[test]
    fn public_message_never_leaks_detail() {
        let e = FlashgenError::UpstreamUnavailable(CompletionError::Api(
            "401 invalid key sk-secret".into(),
        ));
        assert!(!e.public_message().contains("sk-secret"));
    }

    #[test]
    fn extract_error_conversion() {
        let e: FlashgenError = ExtractError::UnsupportedFormat("text/csv".into()).into();
        assert_eq!(e.kind(), ErrorKind::UnsupportedFormat);

        let e: FlashgenError = ExtractError::Corrupt("bad xref".into()).into();
        assert_eq!(e.kind(), ErrorKind::Internal);
        assert_eq!(e.status_code(), 500);
    }
}
