//! Document text extraction: uploaded bytes + media type → plain text.
//!
//! ## Why a trait?
//!
//! Extraction is the one collaborator that needs native code (pdfium). Hosts
//! that already have text extraction, and tests that must not load a PDF
//! engine, inject their own [`ContentExtractor`]; [`DocumentExtractor`] is the
//! default used by [`crate::generate::Generator::from_config`].
//!
//! Implementations are synchronous. The generator calls them from
//! `tokio::task::spawn_blocking`, since pdfium uses thread-local state and must
//! not run on a Tokio worker thread.

use crate::error::ExtractError;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use std::path::Path;
use tracing::{debug, info};

/// PDF media type.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";
/// Office Open XML word-processing document (`.docx`).
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Legacy Word media type; accepted, but only OOXML content can be read.
pub const MSWORD_MEDIA_TYPE: &str = "application/msword";

/// Converts an uploaded document into plain text.
pub trait ContentExtractor: Send + Sync {
    /// Extract the text of `bytes`, declared as `media_type`.
    ///
    /// Returns [`ExtractError::UnsupportedFormat`] for any media type the
    /// implementation does not handle.
    fn extract_text(&self, bytes: &[u8], media_type: &str) -> Result<String, ExtractError>;
}

/// Default extractor: PDF via pdfium, Word via docx-rs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl ContentExtractor for DocumentExtractor {
    fn extract_text(&self, bytes: &[u8], media_type: &str) -> Result<String, ExtractError> {
        match DocumentFormat::from_media_type(media_type) {
            Some(DocumentFormat::Pdf) => extract_pdf(bytes),
            Some(DocumentFormat::Word) => extract_docx(bytes),
            None => Err(ExtractError::UnsupportedFormat(media_type.to_string())),
        }
    }
}

/// Document families the default extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Word,
}

impl DocumentFormat {
    /// Map a declared media type (parameters such as `; charset=` ignored).
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MEDIA_TYPE => Some(DocumentFormat::Pdf),
            DOCX_MEDIA_TYPE | MSWORD_MEDIA_TYPE => Some(DocumentFormat::Word),
            _ => None,
        }
    }
}

/// Infer a media type from a file name's extension.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF_MEDIA_TYPE),
        "docx" => Some(DOCX_MEDIA_TYPE),
        "doc" => Some(MSWORD_MEDIA_TYPE),
        _ => None,
    }
}

// ── PDF ──────────────────────────────────────────────────────────────────────

/// Concatenate the text of every page, each followed by a newline.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pdfium =
        pdfium_auto::bind_pdfium_silent().map_err(|e| ExtractError::EngineUnavailable(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractError::Corrupt(format!("{:?}", e)))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| ExtractError::Corrupt(format!("page {}: {:?}", idx + 1, e)))?;
        text.push_str(&page_text.all());
        text.push('\n');
    }

    debug!("Extracted {} chars from PDF", text.chars().count());
    Ok(text)
}

// ── Word ─────────────────────────────────────────────────────────────────────

/// Paragraph texts joined with newlines; empty paragraphs are skipped.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Corrupt(format!("{:?}", e)))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    debug!("Extracted {} paragraphs from Word document", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

/// Runs within a paragraph are fragments of one line; join without separator.
fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut out = String::new();
    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                if let RunChild::Text(t) = rc {
                    out.push_str(&t.text);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_mapping() {
        assert_eq!(
            DocumentFormat::from_media_type("application/pdf"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_media_type("Application/PDF; name=x.pdf"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_media_type(DOCX_MEDIA_TYPE),
            Some(DocumentFormat::Word)
        );
        assert_eq!(
            DocumentFormat::from_media_type(MSWORD_MEDIA_TYPE),
            Some(DocumentFormat::Word)
        );
        assert_eq!(DocumentFormat::from_media_type("text/plain"), None);
    }

    #[test]
    fn unsupported_media_type_is_rejected_without_parsing() {
        let err = DocumentExtractor
            .extract_text(b"hello world", "image/png")
            .unwrap_err();
        assert_eq!(err, ExtractError::UnsupportedFormat("image/png".into()));
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for_path(Path::new("notes.PDF")), Some(PDF_MEDIA_TYPE));
        assert_eq!(media_type_for_path(Path::new("a/b/essay.docx")), Some(DOCX_MEDIA_TYPE));
        assert_eq!(media_type_for_path(Path::new("old.doc")), Some(MSWORD_MEDIA_TYPE));
        assert_eq!(media_type_for_path(Path::new("photo.jpg")), None);
        assert_eq!(media_type_for_path(Path::new("README")), None);
    }

    #[test]
    fn corrupt_docx_is_reported() {
        let err = DocumentExtractor
            .extract_text(b"definitely not a zip archive", DOCX_MEDIA_TYPE)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Corrupt(_)), "got {err:?}");
    }

    #[test]
    fn docx_paragraphs_are_joined() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buf = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("Photosynthesis"))
                    .add_run(Run::new().add_text("Converts")),
            )
            .add_paragraph(Paragraph::new())
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Chlorophyll")))
            .build()
            .pack(&mut buf)
            .expect("pack docx");

        let text = DocumentExtractor
            .extract_text(buf.get_ref(), DOCX_MEDIA_TYPE)
            .expect("extract docx");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["PhotosynthesisConverts", "Chlorophyll"]);
    }
}
