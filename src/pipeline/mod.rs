//! Pipeline stages for answering a study question.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the external capabilities (pdfium, the hosted
//! model) sit behind exactly one seam each.
//!
//! ## Data Flow
//!
//! ```text
//! pdf bytes ──▶ extract ─┐
//!                        ├─▶ notes ─▶ prompts::compose ─▶ llm ─▶ format
//! image bytes ▶ encode ──▶ transcribe ─┘
//! ```
//!
//! 1. [`input`]      — CLI only: read a path into an `Upload`
//! 2. [`extract`]    — selectable PDF text via pdfium; failures become `None`
//! 3. [`encode`]     — decode any image, force RGB, base64 PNG
//! 4. [`transcribe`] — vision-model call with the fixed OCR instruction
//! 5. [`llm`]        — the generation seam plus retry/backoff; the only stage
//!    with network I/O
//! 6. [`format`]     — line breaks to display markup

pub mod encode;
pub mod extract;
pub mod format;
pub mod input;
pub mod llm;
pub mod transcribe;
