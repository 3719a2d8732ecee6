//! Pipeline stages for flashcard/quiz generation.
//!
//! Each submodule implements exactly one step, so each is testable on its own
//! and the collaborators with I/O (extraction, completion) sit behind traits
//! that [`crate::generate::Generator`] receives at construction.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (bound) ──▶ completion ──▶ sanitize ──▶ validate
//! (path/URL) (pdf/docx)  20..8000    (LLM, ≤2×)    (fences, {…})  (shape)
//! ```
//!
//! 1. [`input`]      — turn a CLI path or URL into an [`crate::request::Upload`]
//! 2. [`extract`]    — document bytes → plain text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`completion`] — the LLM boundary; the only stage with model I/O
//! 4. [`sanitize`]   — best-effort recovery of a JSON object from model text
//! 5. [`validate`]   — structural check into typed records

pub mod completion;
pub mod extract;
pub mod input;
pub mod sanitize;
pub mod validate;
