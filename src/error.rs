//! Error types for the focus-study library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`StudyError`] — everything a caller of [`crate::Tutor`] can see. The
//!   per-request variants (blank question, unreadable PDF, failed
//!   transcription, failed generation) are rendered inline to the student;
//!   the startup variants (missing credential, provider or pdfium not
//!   available) stop the process before it serves anything.
//!
//! * [`GenerationError`] — a single failed model call. The retry loop in
//!   [`crate::pipeline::llm`] keeps the last one and hands it back unchanged,
//!   so its `Display` is exactly what the provider reported.
//!
//! * [`DocumentError`] — the PDF capability failed. It never leaves
//!   [`crate::pipeline::extract`]: the extractor absorbs it into "no
//!   extractable text".

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the focus-study library.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The question was empty or whitespace only.
    #[error("Please type your question.")]
    Validation,

    /// The PDF had no selectable text (scanned, handwritten, encrypted or corrupt).
    #[error("This PDF looks scanned/handwritten. Please upload clear images instead.")]
    UnreadableDocument,

    /// The image could not be decoded or the vision model call failed.
    #[error("Image OCR failed: {message}")]
    Transcription { message: String },

    /// The answer model failed on every attempt.
    #[error("Generation failed: {message}")]
    Generation { message: String },

    // ── Startup errors ────────────────────────────────────────────────────
    /// The model credential is not set.
    #[error("{var} not set.\nRun: export {var}=YOUR_KEY")]
    MissingCredential { var: String },

    /// The configured provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set --pdfium-lib (or FOCUS_STUDY_PDFIUM_LIB) to the directory holding libpdfium,\n\
or install it in a system library path."
    )]
    PdfiumBindingFailed(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors (CLI file arguments) ─────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading an input file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StudyError {
    /// True for errors caused by a single request, which are shown to the
    /// student next to the form instead of failing the process.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            StudyError::Validation
                | StudyError::UnreadableDocument
                | StudyError::Transcription { .. }
                | StudyError::Generation { .. }
        )
    }
}

/// A single failed call to the generation capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The provider rejected or failed the call (transport, auth, quota, …).
    #[error("{0}")]
    Provider(String),

    /// No provider was created for the requested model id.
    #[error("no provider configured for model '{0}'")]
    UnknownModel(String),
}

/// The PDF capability could not produce page text.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("pdfium unavailable: {0}")]
    Binding(String),

    #[error("cannot open document: {0}")]
    Open(String),

    #[error("page {page}: {detail}")]
    Page { page: usize, detail: String },

    #[error("extraction task panicked: {0}")]
    Panicked(String),
}
