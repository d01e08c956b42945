//! Prompts sent to the generation model.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the answer model is tuned against the exact
//!    wording and section order below; changing it happens in one place.
//!
//! 2. **Testability** — the composer is a pure function, so unit tests can
//!    inspect prompts directly without a real model.
//!
//! ## Prompt layout
//!
//! ```text
//! preamble            persona, notes-only rule, refusal phrase, formatting
//! mode line           one of EXPLAIN / EXAM READY / REVISION
//! NOTES block         notes text, or "(none)"
//! QUESTION + ANSWER:  the question and the answer cue
//! ```
//!
//! Callers can override the preamble via [`crate::config::StudyConfig::preamble`];
//! the mode lines, notes placeholder and section order are fixed.

use crate::request::Mode;

/// Default preamble: who the model is and how it must use the notes.
pub const DEFAULT_PREAMBLE: &str = "You are FocusStudy AI, an exam-focused tutor.\n\
Use ONLY the provided notes. If notes do not contain the answer, say:\n\
\"I can't find this in the provided notes.\" Then give a short general hint (2-3 lines max).\n\
Format cleanly using headings and bullet points.\n";

/// Phrase the model must emit when the notes do not cover the question.
pub const REFUSAL_PHRASE: &str = "I can't find this in the provided notes.";

/// Placeholder used in the NOTES block when no notes were supplied.
pub const NO_NOTES: &str = "(none)";

/// Instruction sent alongside an image to transcribe it.
pub const TRANSCRIBE_INSTRUCTION: &str = "Extract the handwritten text clearly and accurately. \
Return ONLY the extracted text. No extra commentary.";

/// The mode line for `mode`, newline-terminated.
pub fn mode_line(mode: Mode) -> &'static str {
    match mode {
        Mode::Explain => "Mode: EXPLAIN. Explain simply and give one small example.\n",
        Mode::Exam => {
            "Mode: EXAM READY. Write a structured exam answer with headings + key points.\n"
        }
        Mode::Revision => "Mode: REVISION. Give crisp revision bullets.\n",
    }
}

/// The NOTES section. Blank notes become the `(none)` placeholder; anything
/// else is included verbatim.
pub fn notes_block(notes: &str) -> String {
    if notes.trim().is_empty() {
        format!("\nNOTES: {NO_NOTES}\n")
    } else {
        format!("\nNOTES:\n{notes}\n")
    }
}

/// Build the answer prompt with the default preamble.
pub fn compose(mode: Mode, question: &str, notes: &str) -> String {
    compose_with_preamble(DEFAULT_PREAMBLE, mode, question, notes)
}

/// Build the answer prompt with a caller-supplied preamble.
pub fn compose_with_preamble(preamble: &str, mode: Mode, question: &str, notes: &str) -> String {
    format!(
        "{preamble}{}{}\nQUESTION:\n{question}\n\nANSWER:\n",
        mode_line(mode),
        notes_block(notes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_appear_in_order() {
        let p = compose(Mode::Exam, "Define entropy.", "Entropy is disorder.");
        let preamble = p.find("FocusStudy AI").unwrap();
        let mode = p.find("Mode: EXAM READY").unwrap();
        let notes = p.find("NOTES:\nEntropy is disorder.").unwrap();
        let question = p.find("QUESTION:\nDefine entropy.").unwrap();
        let answer = p.find("ANSWER:").unwrap();
        assert!(preamble < mode && mode < notes && notes < question && question < answer);
        assert!(p.ends_with("ANSWER:\n"));
    }

    #[test]
    fn blank_notes_use_placeholder() {
        for notes in ["", "   ", "\n\t\n"] {
            let p = compose(Mode::Explain, "q", notes);
            assert!(p.contains("\nNOTES: (none)\n"), "notes {notes:?}: {p}");
        }
    }

    #[test]
    fn notes_are_not_truncated() {
        let notes = "x".repeat(50_000);
        let p = compose(Mode::Revision, "q", &notes);
        assert!(p.contains(&notes));
    }

    #[test]
    fn compose_is_deterministic() {
        let a = compose(Mode::Revision, "What is osmosis?", "water moves");
        let b = compose(Mode::Revision, "What is osmosis?", "water moves");
        assert_eq!(a, b);
    }

    #[test]
    fn every_mode_has_its_own_line() {
        assert!(compose(Mode::Explain, "q", "").contains("Mode: EXPLAIN. Explain simply"));
        assert!(compose(Mode::Exam, "q", "").contains("Mode: EXAM READY."));
        assert!(compose(Mode::Revision, "q", "").contains("Mode: REVISION."));
    }

    #[test]
    fn unknown_mode_gets_explain_line() {
        let p = compose(Mode::parse_or_default("flashcards"), "q", "");
        assert!(p.contains(mode_line(Mode::Explain)));
    }

    #[test]
    fn default_preamble_carries_refusal_phrase() {
        assert!(DEFAULT_PREAMBLE.contains(REFUSAL_PHRASE));
        assert!(compose(Mode::Explain, "q", "").starts_with(DEFAULT_PREAMBLE));
    }

    #[test]
    fn custom_preamble_keeps_layout() {
        let p = compose_with_preamble("Tu es un tuteur.\n", Mode::Exam, "q", "");
        assert!(p.starts_with("Tu es un tuteur.\nMode: EXAM READY."));
        assert!(p.contains("NOTES: (none)"));
    }
}
