//! Image transcription through the multimodal model.
//!
//! Unlike PDF extraction, failures here are surfaced: a photo that the model
//! could not read is something the student can fix (retake, crop, retry), so
//! the error message reaches them wrapped in [`StudyError::Transcription`].

use crate::error::StudyError;
use crate::pipeline::encode::encode_image;
use crate::pipeline::llm::{Content, GenerationClient, Part};
use crate::prompts::TRANSCRIBE_INSTRUCTION;
use tracing::{debug, info};

/// Transcribe the text in an image (handwriting included), trimmed.
///
/// The request is the fixed instruction followed by the image, sent to
/// `model` through the retrying client.
pub async fn transcribe_image(
    client: &GenerationClient,
    model: &str,
    bytes: &[u8],
) -> Result<String, StudyError> {
    let image = encode_image(bytes).map_err(|e| StudyError::Transcription {
        message: format!("cannot decode image: {e}"),
    })?;

    let content = Content::Parts(vec![
        Part::Text(TRANSCRIBE_INSTRUCTION.to_string()),
        Part::Image(image),
    ]);

    info!("Transcribing image ({} bytes) with {}", bytes.len(), model);
    let generation = client
        .generate(model, &content)
        .await
        .map_err(|e| StudyError::Transcription {
            message: e.to_string(),
        })?;

    let text = generation.text.trim().to_string();
    debug!("Transcribed {} chars", text.len());
    Ok(text)
}
