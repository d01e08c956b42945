//! Request types: what a student submits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tutoring style controlling the mode line of the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Simple explanation with one small example. (default)
    #[default]
    Explain,
    /// Structured exam answer with headings and key points.
    Exam,
    /// Crisp revision bullets.
    Revision,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Explain, Mode::Exam, Mode::Revision];

    /// Form key for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Explain => "explain",
            Mode::Exam => "exam",
            Mode::Revision => "revision",
        }
    }

    /// Parse a form value, falling back to [`Mode::Explain`] for anything
    /// that is not an exact mode key.
    pub fn parse_or_default(s: &str) -> Mode {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for [`Mode::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected explain, exam or revision)")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    /// Exact, case-sensitive lookup over the three mode keys.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explain" => Ok(Mode::Explain),
            "exam" => Ok(Mode::Exam),
            "revision" => Ok(Mode::Revision),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// An uploaded file: raw bytes plus the client-side name, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            bytes,
        }
    }

    /// Bytes without a name (library callers that already hold the data).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            file_name: None,
            bytes,
        }
    }

    /// A browser posts an empty, unnamed part for an untouched file input.
    /// Such a part does not count as an attachment.
    pub fn is_attached(&self) -> bool {
        let named = self
            .file_name
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty());
        named || !self.bytes.is_empty()
    }
}

/// One student request. Lives for a single [`crate::Tutor::answer`] call.
#[derive(Debug, Clone, Default)]
pub struct StudyRequest {
    pub mode: Mode,
    pub question: String,
    pub pdf: Option<Upload>,
    pub image: Option<Upload>,
}

impl StudyRequest {
    pub fn new(mode: Mode, question: impl Into<String>) -> Self {
        Self {
            mode,
            question: question.into(),
            pdf: None,
            image: None,
        }
    }

    pub fn with_pdf(mut self, pdf: Upload) -> Self {
        self.pdf = Some(pdf);
        self
    }

    pub fn with_image(mut self, image: Upload) -> Self {
        self.image = Some(image);
        self
    }
}
