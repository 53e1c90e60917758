//! Detector diagnostics for a single image file.

use anyhow::{Context, Result};
use facematch_core::decode::{self, DecodeError};
use facematch_core::detector;
use facematch_core::{BoundingBox, PixelImage};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub width: u32,
    pub height: u32,
    pub faces: Vec<BoundingBox>,
    /// Index into `faces` of the face the comparison would use.
    pub selected: Option<usize>,
}

impl DetectReport {
    pub fn new(image: &PixelImage, faces: Vec<BoundingBox>) -> Self {
        let selected = detector::most_prominent(&faces)
            .and_then(|best| faces.iter().position(|f| std::ptr::eq(f, best)));
        Self {
            width: image.width(),
            height: image.height(),
            faces,
            selected,
        }
    }
}

/// Read an image file holding either raw image bytes or base64 text.
pub fn load_image(path: &Path) -> Result<PixelImage> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    decode_file_contents(&bytes).with_context(|| format!("decoding {}", path.display()))
}

fn decode_file_contents(bytes: &[u8]) -> Result<PixelImage, DecodeError> {
    match decode::decode_bytes(bytes) {
        Ok(image) => Ok(image),
        Err(raw_err) => match std::str::from_utf8(bytes) {
            Ok(text) => decode::decode(text.trim()),
            Err(_) => Err(raw_err),
        },
    }
}
