//! facematch-core — two face images in, one calibrated match verdict out.
//!
//! Decodes base64 image payloads, extracts ArcFace embeddings through an
//! injected [`FaceEmbedder`] (SCRFD + ArcFace over ONNX Runtime in
//! production), scores them by cosine similarity and applies a fixed
//! percent threshold.

pub mod alignment;
pub mod decision;
pub mod decode;
pub mod detector;
pub mod embedder;
pub mod pipeline;
pub mod recognizer;
pub mod types;
pub mod wire;

use std::path::PathBuf;

pub use decision::{MatchDecision, MatchPolicy, DEFAULT_MATCH_THRESHOLD};
pub use embedder::{EmbedderConfig, EmbedderError, FaceEmbedder, OnnxFaceEmbedder, MODEL_NAME};
pub use pipeline::{ComparisonError, ComparisonPipeline, ComparisonResult, MatchOutcome};
pub use types::{BoundingBox, Embedding, ImageSlot, PixelImage, EMBEDDING_DIM};
pub use wire::{CompareRequest, CompareResponse};

/// System-wide model location used by packaged installs.
const SYSTEM_MODEL_DIR: &str = "/usr/share/facematch/models";

/// Default directory holding the buffalo_l ONNX files.
///
/// Prefers the packaged system directory when it exists, otherwise
/// `$XDG_DATA_HOME/facematch/models` (falling back to `~/.local/share`).
pub fn default_model_dir() -> PathBuf {
    let system = PathBuf::from(SYSTEM_MODEL_DIR);
    if system.is_dir() {
        return system;
    }

    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facematch/models")
}
