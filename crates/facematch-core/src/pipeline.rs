//! decode → embed → score → decide, with every failure folded into the result.

use crate::decision::MatchPolicy;
use crate::decode::{self, DecodeError};
use crate::embedder::{EmbedderError, FaceEmbedder};
use crate::types::{Embedding, ImageSlot, PixelImage};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Why a comparison did not produce a verdict.
///
/// The `Display` output is the caller-facing reason string.
#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("invalid image format: {source}")]
    InvalidImage {
        slot: ImageSlot,
        #[source]
        source: DecodeError,
    },
    #[error("No face detected in Aadhaar image. Please ensure the image clearly shows your face.")]
    NoFaceInAadhaar,
    #[error("No face detected in live image. Please ensure your face is clearly visible in the camera.")]
    NoFaceInLive,
    #[error("Face comparison failed: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("Face comparison failed: embedding dimension mismatch ({aadhaar} vs {live})")]
    DimensionMismatch { aadhaar: usize, live: usize },
    #[error("Face comparison failed: {0}")]
    Panicked(String),
}

impl ComparisonError {
    fn no_face(slot: ImageSlot) -> Self {
        match slot {
            ImageSlot::Aadhaar => ComparisonError::NoFaceInAadhaar,
            ImageSlot::Live => ComparisonError::NoFaceInLive,
        }
    }
}

/// A completed comparison, at full precision.
///
/// Only [`ComparisonPipeline::compare`] produces one, after both images
/// yielded an embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    similarity_percent: f64,
    raw_similarity: f64,
    is_match: bool,
    threshold: f64,
}

impl MatchOutcome {
    pub(crate) fn new(similarity_percent: f64, raw_similarity: f64, is_match: bool, threshold: f64) -> Self {
        Self {
            similarity_percent,
            raw_similarity,
            is_match,
            threshold,
        }
    }

    /// Similarity on the [0, 100] scale.
    pub fn similarity_percent(&self) -> f64 {
        self.similarity_percent
    }

    /// Cosine similarity in [-1, 1].
    pub fn raw_similarity(&self) -> f64 {
        self.raw_similarity
    }

    pub fn is_match(&self) -> bool {
        self.is_match
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Outcome of one comparison. Exactly one variant per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonResult {
    Success(MatchOutcome),
    Failure { reason: String },
}

impl ComparisonResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        ComparisonResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ComparisonResult::Success(_))
    }
}

impl From<Result<MatchOutcome, ComparisonError>> for ComparisonResult {
    fn from(result: Result<MatchOutcome, ComparisonError>) -> Self {
        match result {
            Ok(outcome) => ComparisonResult::Success(outcome),
            Err(e) => ComparisonResult::failure(e.to_string()),
        }
    }
}

/// Owns the embedder and the match policy.
pub struct ComparisonPipeline<E> {
    embedder: E,
    policy: MatchPolicy,
}

impl<E: FaceEmbedder> ComparisonPipeline<E> {
    pub fn new(embedder: E, policy: MatchPolicy) -> Self {
        Self { embedder, policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Compare the Aadhaar (reference) image against the live capture.
    ///
    /// Never fails and never unwinds: every error, including a panic in the
    /// embedder, becomes [`ComparisonResult::Failure`].
    pub fn compare(&mut self, aadhaar: &str, live: &str) -> ComparisonResult {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.try_compare(aadhaar, live)));

        let result = match attempt {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic = %message, "embedder panicked; its session may be in an inconsistent state");
                Err(ComparisonError::Panicked(message))
            }
        };

        match &result {
            Ok(outcome) => tracing::info!(
                similarity = outcome.similarity_percent,
                raw = outcome.raw_similarity,
                matched = outcome.is_match,
                "comparison complete"
            ),
            Err(e) => tracing::warn!(error = %e, "comparison failed"),
        }

        result.into()
    }

    fn try_compare(&mut self, aadhaar: &str, live: &str) -> Result<MatchOutcome, ComparisonError> {
        let aadhaar_image = decode_slot(ImageSlot::Aadhaar, aadhaar)?;
        let live_image = decode_slot(ImageSlot::Live, live)?;

        let aadhaar_embedding = self.embed_slot(ImageSlot::Aadhaar, &aadhaar_image)?;
        let live_embedding = self.embed_slot(ImageSlot::Live, &live_image)?;

        if aadhaar_embedding.dim() != live_embedding.dim() {
            return Err(ComparisonError::DimensionMismatch {
                aadhaar: aadhaar_embedding.dim(),
                live: live_embedding.dim(),
            });
        }

        let raw = aadhaar_embedding.similarity(&live_embedding) as f64;
        let decision = self.policy.decide(raw);

        Ok(MatchOutcome::new(
            decision.similarity_percent,
            raw,
            decision.is_match,
            decision.threshold,
        ))
    }

    fn embed_slot(&mut self, slot: ImageSlot, image: &PixelImage) -> Result<Embedding, ComparisonError> {
        tracing::debug!(%slot, width = image.width(), height = image.height(), "extracting embedding");
        self.embedder
            .embed(image)?
            .ok_or_else(|| ComparisonError::no_face(slot))
    }
}

fn decode_slot(slot: ImageSlot, payload: &str) -> Result<PixelImage, ComparisonError> {
    decode::decode(payload).map_err(|source| {
        tracing::debug!(%slot, error = %source, "image decode failed");
        ComparisonError::InvalidImage { slot, source }
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "embedder panicked".to_string()
    }
}
