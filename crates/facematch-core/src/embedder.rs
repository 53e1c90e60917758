//! The face embedding capability injected into the comparison pipeline.

use crate::detector::{self, DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{Embedding, PixelImage};
use std::path::PathBuf;
use thiserror::Error;

/// Human-readable name of the model pack behind [`OnnxFaceEmbedder`].
pub const MODEL_NAME: &str = "InsightFace buffalo_l";

const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("{0}")]
    Internal(String),
}

/// Maps an image to the identity embedding of its most prominent face.
///
/// Implementations are expensive to build and not reentrant: create one per
/// process and hand it to a single owner. The `&mut self` receiver makes
/// concurrent use of one instance impossible.
pub trait FaceEmbedder {
    /// `Ok(None)` when the image contains no face.
    fn embed(&mut self, image: &PixelImage) -> Result<Option<Embedding>, EmbedderError>;
}

impl<E: FaceEmbedder + ?Sized> FaceEmbedder for Box<E> {
    fn embed(&mut self, image: &PixelImage) -> Result<Option<Embedding>, EmbedderError> {
        (**self).embed(image)
    }
}

/// Where to find the ONNX models and how to run them.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Directory containing `det_10g.onnx` and `w600k_r50.onnx`.
    pub model_dir: PathBuf,
    /// ONNX Runtime intra-op threads per session.
    pub intra_threads: usize,
}

impl EmbedderConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            intra_threads: 2,
        }
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> PathBuf {
        self.model_dir.join(SCRFD_MODEL_FILE)
    }

    /// Path to the ArcFace recognition model.
    pub fn arcface_model_path(&self) -> PathBuf {
        self.model_dir.join(ARCFACE_MODEL_FILE)
    }
}

/// SCRFD detection + ArcFace recognition.
pub struct OnnxFaceEmbedder {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxFaceEmbedder {
    /// Load both models. Fails fast if either file is missing or invalid.
    pub fn load(config: &EmbedderConfig) -> Result<Self, EmbedderError> {
        let detector = FaceDetector::load(&config.scrfd_model_path(), config.intra_threads)?;
        let recognizer = FaceRecognizer::load(&config.arcface_model_path(), config.intra_threads)?;
        Ok(Self {
            detector,
            recognizer,
        })
    }

    pub fn detector_mut(&mut self) -> &mut FaceDetector {
        &mut self.detector
    }
}

impl FaceEmbedder for OnnxFaceEmbedder {
    fn embed(&mut self, image: &PixelImage) -> Result<Option<Embedding>, EmbedderError> {
        let faces = self.detector.detect(image)?;
        let Some(face) = detector::most_prominent(&faces) else {
            return Ok(None);
        };

        tracing::debug!(
            candidates = faces.len(),
            confidence = face.confidence,
            width = face.width,
            height = face.height,
            "selected most prominent face"
        );

        Ok(Some(self.recognizer.extract(image, face)?))
    }
}
