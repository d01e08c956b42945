//! Plain-text answer → display markup.
//!
//! Line breaks only. The answer is not HTML-escaped: whatever markup the
//! model emits reaches the page as-is.

/// Paragraph break marker.
pub const PARAGRAPH_BREAK: &str = "<br><br>";

/// Line break marker.
pub const LINE_BREAK: &str = "<br>";

/// Convert model text to markup.
///
/// Rule order matters: CRLF is normalised first, then double breaks become
/// paragraph markers before single breaks are converted, so a paragraph
/// break never degrades into two line markers.
pub fn to_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.replace("\r\n", "\n")
        .replace("\n\n", PARAGRAPH_BREAK)
        .replace('\n', LINE_BREAK)
}
