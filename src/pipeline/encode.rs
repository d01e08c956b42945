//! Image encoding: uploaded bytes → RGB → base64 PNG wrapped in [`ImagePart`].
//!
//! Students upload whatever their phone produced: JPEG, PNG with alpha, a
//! palette GIF, sometimes a 16-bit scan. Decoding and forcing everything into
//! a 3-channel RGB buffer gives the vision model one predictable input. PNG is
//! chosen for the re-encode because it is lossless; handwriting strokes
//! matter more than file size.

use crate::pipeline::llm::ImagePart;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Decode arbitrary image bytes into an RGB buffer.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.into_rgb8())
}

/// Decode, normalise to RGB and encode as a base64 PNG ready for the model.
pub fn encode_image(bytes: &[u8]) -> Result<ImagePart, image::ImageError> {
    let rgb = decode_rgb(bytes)?;
    debug!("Decoded image → {}x{} px RGB", rgb.width(), rgb.height());

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImagePart {
        mime_type: "image/png".to_string(),
        data: b64,
    })
}
