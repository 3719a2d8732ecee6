//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to observe a
//! request as it moves through extraction, the completion call(s) and
//! validation. The CLI uses it to drive a spinner; a server could forward the
//! events to a log or a websocket.
//!
//! # Example
//!
//! ```rust
//! use flashgen::{GenerationConfig, GenerationProgressCallback};
//! use std::sync::Arc;
//!
//! struct RetryLogger;
//!
//! impl GenerationProgressCallback for RetryLogger {
//!     fn on_retry(&self, reason: &str) {
//!         eprintln!("retrying: {reason}");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(RetryLogger))
//!     .build()
//!     .unwrap();
//! ```

use crate::artifact::ArtifactKind;
use std::sync::Arc;

/// Called by the generator at each step of a request.
///
/// All methods have no-op defaults. Implementations must be `Send + Sync`
/// because one generator serves concurrent requests.
pub trait GenerationProgressCallback: Send + Sync {
    /// A request was accepted.
    fn on_generation_start(&self, kind: ArtifactKind) {
        let _ = kind;
    }

    /// Source text is resolved and bounded.
    ///
    /// `chars` is the length forwarded to the model; `truncated` is true when
    /// the source was cut to the configured maximum.
    fn on_content_resolved(&self, chars: usize, truncated: bool) {
        let _ = (chars, truncated);
    }

    /// A completion call is about to be sent (1 = first, 2 = repair retry).
    fn on_attempt_start(&self, attempt: u32) {
        let _ = attempt;
    }

    /// The first response was unusable and the repair retry will run.
    fn on_retry(&self, reason: &str) {
        let _ = reason;
    }

    /// The request finished.
    fn on_generation_complete(&self, success: bool) {
        let _ = success;
    }
}

/// Shared handle stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}
