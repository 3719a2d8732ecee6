//! # flashgen
//!
//! Generate study flashcards and multiple-choice quizzes from text, PDF or
//! Word documents with a Large Language Model.
//!
//! ## Why this crate?
//!
//! Asking a chat model for "10 flashcards as JSON" works most of the time.
//! The rest of the time the answer is wrapped in a Markdown fence, preceded by
//! a friendly sentence, or has nine items instead of ten. This crate puts a
//! small protocol around the call: sanitize the answer, re-ask once with a
//! stricter instruction if it still isn't JSON, then validate the structure
//! into typed records. Callers get either a well-formed artifact or a
//! classified error, never half-parsed model output.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text / PDF / DOCX
//!  │
//!  ├─ 1. Extract   document bytes → text (pdfium / docx-rs, spawn_blocking)
//!  ├─ 2. Bound     ≥ 20 chars after trim, silently cut to 8000
//!  ├─ 3. Prompt    schema-bearing system prompt + content
//!  ├─ 4. Complete  llama3-8b-8192 @ 0.2 via edgequake-llm
//!  ├─ 5. Sanitize  strip fences, scrape the outer {…}
//!  ├─ 6. Retry     once, strict instruction @ 0.1, only if not JSON
//!  └─ 7. Validate  exactly 10 items, 4 choices, answerIndex 0..3
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flashgen::{respond, ArtifactKind, GenerationConfig, GenerationRequest, Generator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from the environment (see `resolve_provider`)
//!     let generator = Generator::from_config(GenerationConfig::default())?;
//!     let request = GenerationRequest::from_text(
//!         ArtifactKind::Quiz,
//!         std::fs::read_to_string("lecture-notes.txt")?,
//!     );
//!     let outcome = generator.generate(request).await;
//!     let reply = respond(&outcome);
//!     println!("{} {}", reply.status, reply.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flashgen` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! flashgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod response;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{
    Artifact, ArtifactKind, Flashcard, FlashcardSet, QuizQuestion, QuizSet, CHOICE_COUNT, SET_SIZE,
};
pub use config::{GenerationConfig, GenerationConfigBuilder, DEFAULT_MODEL};
pub use error::{CompletionError, ErrorKind, ExtractError, FlashgenError};
pub use generate::{resolve_provider, truncate_chars, Generator};
pub use pipeline::completion::{
    CompletionClient, CompletionRequest, LlmCompletionClient, Message, Role,
};
pub use pipeline::extract::{ContentExtractor, DocumentExtractor};
pub use pipeline::input::resolve_upload;
pub use pipeline::sanitize::{parse_candidate, sanitize};
pub use pipeline::validate::{is_valid, validate, Violation};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{build_prompts, PromptPair};
pub use request::{GenerationRequest, Upload, UploadBody};
pub use response::{respond, GenerateForm, GenerateResponse};
