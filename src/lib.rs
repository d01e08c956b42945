//! # focus-study
//!
//! An exam-focused study tutor: a student asks a question, optionally attaches
//! notes as a typed PDF and/or a photo, and a hosted LLM answers using only
//! those notes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! question + notes
//!  │
//!  ├─ 1. Validate    blank question → error, nothing else runs
//!  ├─ 2. PDF         selectable text via pdfium (no OCR); none → "looks scanned"
//!  ├─ 3. Image       decode → RGB → PNG → vision model transcription
//!  ├─ 4. Compose     preamble + mode line + NOTES + QUESTION + ANSWER cue
//!  ├─ 5. Generate    answer model, 3 attempts, 2/4/6 s linear backoff
//!  └─ 6. Format      line breaks → <br> markup
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use focus_study::{Mode, StudyConfig, StudyRequest, Tutor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY; missing key is a startup error.
//!     let tutor = Tutor::new(StudyConfig::from_env()?)?;
//!     let answer = tutor
//!         .answer(StudyRequest::new(Mode::Explain, "What is osmosis?"))
//!         .await?;
//!     println!("{}", answer.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `focus-study` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | Enables the web front-end (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! focus-study = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod request;
#[cfg(feature = "server")]
pub mod server;
pub mod tutor;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{StudyConfig, StudyConfigBuilder};
pub use error::{DocumentError, GenerationError, StudyError};
pub use output::StudyAnswer;
pub use pipeline::extract::{PageTextSource, PdfiumTextSource};
pub use pipeline::llm::{Content, GenerationBackend, GenerationClient, ImagePart, Part};
pub use request::{Mode, StudyRequest, Upload};
pub use tutor::Tutor;
