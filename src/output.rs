//! Output types returned by [`crate::Tutor::answer`].

use crate::request::Mode;
use serde::{Deserialize, Serialize};

/// A finished tutoring answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyAnswer {
    pub mode: Mode,
    /// Display markup (line breaks converted, not escaped).
    pub markup: String,
    /// Raw model text.
    pub text: String,
    /// Characters (not bytes) of notes the prompt was built from; 0 means no notes.
    pub notes_chars: usize,
    /// Attempt on which the answer model succeeded.
    pub attempts: u32,
    /// Wall-clock time for the whole request.
    pub duration_ms: u64,
}

impl StudyAnswer {
    pub fn used_notes(&self) -> bool {
        self.notes_chars > 0
    }
}
