//! Transport payload → RGB pixel grid.
//!
//! Payloads are radix-64 text, optionally carrying a data URL header such as
//! `data:image/png;base64,` in front of the data.

use crate::types::PixelImage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Separator ending the optional non-payload header.
const HEADER_SEPARATOR: char = ',';

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{0}")]
    Base64(#[from] base64::DecodeError),
    #[error("{0}")]
    Image(#[from] image::ImageError),
    #[error("image has zero dimensions ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Drop everything up to and including the first header separator.
///
/// Only the first separator counts; anything after it is payload.
pub fn strip_header(payload: &str) -> &str {
    match payload.split_once(HEADER_SEPARATOR) {
        Some((_, data)) => data,
        None => payload,
    }
}

/// Decode a radix-64 encoded image into RGB pixels.
pub fn decode(payload: &str) -> Result<PixelImage, DecodeError> {
    let data = strip_header(payload);

    // MIME-wrapped base64 carries line breaks; the standard engine rejects them.
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;

    decode_bytes(&bytes)
}

/// Decode an image container (PNG, JPEG, ...) into RGB pixels.
///
/// Grayscale, palette, alpha and 16-bit inputs are all converted to 8-bit RGB.
pub fn decode_bytes(bytes: &[u8]) -> Result<PixelImage, DecodeError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());
    ensure_non_empty(width, height)?;

    tracing::debug!(width, height, color = ?img.color(), "decoded image");

    Ok(PixelImage::from(img.into_rgb8()))
}

fn ensure_non_empty(width: u32, height: u32) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }
    Ok(())
}
