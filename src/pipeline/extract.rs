//! PDF text extraction: selectable text only, no OCR.
//!
//! ## Why absorb every failure?
//!
//! A student's PDF is either typed (text layer present) or not. Scanned pages,
//! handwriting photos saved as PDF, encrypted files and corrupt uploads all
//! end the same way for the student: ask them for images instead. The
//! extractor therefore returns `None` for every one of those cases and logs
//! the underlying reason; callers cannot, and need not, tell them apart.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is
//! CPU-bound and not safe to call from async contexts. The capability runs on
//! tokio's blocking pool so request tasks are never stalled by a large PDF.

use crate::error::{DocumentError, StudyError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The external document-text capability: one string per page.
pub trait PageTextSource: Send + Sync {
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError>;
}

/// [`PageTextSource`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumTextSource {
    lib_path: Option<PathBuf>,
}

impl PdfiumTextSource {
    /// Searches `lib_path` if given, otherwise `./` and then the system
    /// library paths. Binding happens per document; see [`Self::probe`].
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self { lib_path }
    }

    /// Bind once to fail fast at startup when the library is missing.
    pub fn probe(&self) -> Result<(), StudyError> {
        create_pdfium(self.lib_path.as_deref())
            .map_err(|e| StudyError::PdfiumBindingFailed(e.to_string()))?;
        info!("pdfium bound for text extraction");
        Ok(())
    }
}

impl PageTextSource for PdfiumTextSource {
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
        let pdfium = create_pdfium(self.lib_path.as_deref())?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| DocumentError::Open(format!("{:?}", e)))?;

        let mut texts = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let text = page.text().map_err(|e| DocumentError::Page {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;
            texts.push(text.all());
        }
        Ok(texts)
    }
}

/// Bind pdfium from `lib_path`, or from `./` then the system paths.
fn create_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, DocumentError> {
    let bindings = match lib_path {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| DocumentError::Binding(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Extract the selectable text of a PDF.
///
/// Returns `None` when the document has no extractable text for any reason:
/// every page blank, parse failure, encryption, or a capability error.
pub async fn extract_text(source: Arc<dyn PageTextSource>, bytes: Vec<u8>) -> Option<String> {
    let size = bytes.len();
    let result = tokio::task::spawn_blocking(move || source.page_texts(&bytes))
        .await
        .map_err(|e| DocumentError::Panicked(e.to_string()))
        .and_then(|r| r);

    match result {
        Ok(pages) => {
            let total = pages.len();
            let text = join_pages(pages);
            debug!(
                "PDF: {} bytes, {} pages, {} chars of text",
                size,
                total,
                text.as_deref().map_or(0, str::len)
            );
            text
        }
        Err(e) => {
            warn!("PDF text extraction failed, treating as unreadable: {}", e);
            None
        }
    }
}

/// Trim each page, drop empty pages, join survivors with a blank line.
///
/// `None` when nothing survives.
pub fn join_pages<I, S>(pages: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = pages
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let joined = parts.join("\n\n");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_string())
    }
}
