//! Request orchestration: one student request in, one answer or error out.
//!
//! [`Tutor::answer`] runs a linear state machine and stops at the first
//! failure, so a student never sees a partial answer next to an error:
//!
//! ```text
//! validate ─▶ [pdf] extract ─▶ [image] transcribe ─▶ compose ─▶ generate ─▶ format
//!    │             │                  │                            │
//! Validation  UnreadableDocument  Transcription               Generation
//! ```

use crate::config::StudyConfig;
use crate::error::StudyError;
use crate::output::StudyAnswer;
use crate::pipeline::extract::{self, PageTextSource, PdfiumTextSource};
use crate::pipeline::llm::{Content, GenerationBackend, GenerationClient, ProviderBackend};
use crate::pipeline::{format, transcribe};
use crate::prompts;
use crate::request::{Mode, StudyRequest, Upload};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Answers study questions. Build once at startup, share behind an `Arc`.
pub struct Tutor {
    config: StudyConfig,
    client: GenerationClient,
    pages: Arc<dyn PageTextSource>,
}

impl Tutor {
    /// Resolve the collaborators named by `config`.
    ///
    /// Pre-built collaborators in the config win; otherwise an
    /// `edgequake-llm` provider is created per model (failure is a startup
    /// error) and pdfium is used for PDFs. Call [`PdfiumTextSource::probe`]
    /// first to fail fast when PDFs must be supported.
    pub fn new(config: StudyConfig) -> Result<Self, StudyError> {
        let backend = resolve_backend(&config)?;
        let pages: Arc<dyn PageTextSource> = match config.page_source {
            Some(ref source) => Arc::clone(source),
            None => Arc::new(PdfiumTextSource::new(config.pdfium_lib_path.clone())),
        };
        let client = GenerationClient::from_config(backend, &config);
        info!(
            "Tutor ready: text model {}, vision model {}, {} attempt(s)",
            config.text_model,
            config.vision_model,
            client.max_attempts()
        );
        Ok(Self {
            config,
            client,
            pages,
        })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Answer one request.
    pub async fn answer(&self, request: StudyRequest) -> Result<StudyAnswer, StudyError> {
        let start = Instant::now();
        let StudyRequest {
            mode,
            question,
            pdf,
            image,
        } = request;

        // ── Step 1: Validate ─────────────────────────────────────────────
        let question = question.trim();
        if question.is_empty() {
            return Err(StudyError::Validation);
        }
        info!("Question received ({} chars, mode {})", question.len(), mode);

        // ── Step 2: PDF notes ────────────────────────────────────────────
        let mut notes = String::new();
        if let Some(pdf) = pdf.filter(Upload::is_attached) {
            let text = extract::extract_text(Arc::clone(&self.pages), pdf.bytes)
                .await
                .ok_or(StudyError::UnreadableDocument)?;
            debug!("PDF notes: {} chars", text.len());
            notes = text;
        }

        // ── Step 3: Image notes ──────────────────────────────────────────
        if let Some(image) = image.filter(Upload::is_attached) {
            let text =
                transcribe::transcribe_image(&self.client, &self.config.vision_model, &image.bytes)
                    .await?;
            append_notes(&mut notes, &text);
        }

        // ── Step 4: Compose ──────────────────────────────────────────────
        let prompt = self.compose(mode, question, &notes);

        // ── Step 5: Generate ─────────────────────────────────────────────
        let generation = self
            .client
            .generate(&self.config.text_model, &Content::Text(prompt))
            .await
            .map_err(|e| {
                warn!("Answer generation failed: {}", e);
                StudyError::Generation {
                    message: e.to_string(),
                }
            })?;

        // ── Step 6: Format ───────────────────────────────────────────────
        let markup = format::to_markup(&generation.text);
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Answered in {}ms ({} chars, attempt {})",
            duration_ms,
            generation.text.len(),
            generation.attempts
        );

        Ok(StudyAnswer {
            mode,
            markup,
            text: generation.text,
            notes_chars: notes.chars().count(),
            attempts: generation.attempts,
            duration_ms,
        })
    }

    /// The prompt this tutor would send for the given inputs.
    pub fn compose(&self, mode: Mode, question: &str, notes: &str) -> String {
        prompts::compose_with_preamble(self.config.preamble(), mode, question, notes)
    }
}

/// Append a transcription to the notes, blank-line joined.
///
/// An empty transcription leaves the notes untouched.
pub fn append_notes(notes: &mut String, extra: &str) {
    if extra.is_empty() {
        return;
    }
    if notes.is_empty() {
        notes.push_str(extra);
    } else {
        let joined = format!("{notes}\n\n{extra}");
        *notes = joined.trim().to_string();
    }
}

/// Use the pre-built backend if any, else create `edgequake-llm` providers.
fn resolve_backend(config: &StudyConfig) -> Result<Arc<dyn GenerationBackend>, StudyError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    Ok(Arc::new(ProviderBackend::from_config(config)?))
}
