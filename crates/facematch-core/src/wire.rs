//! JSON request/response shapes shared by the HTTP and pipe front ends.

use crate::decision::round_to;
use crate::pipeline::ComparisonResult;
use serde::{Deserialize, Serialize, Serializer};

/// Body of a comparison request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompareRequest {
    /// Base64 face image cropped from the Aadhaar card.
    #[serde(rename = "aadhaarFaceImage")]
    pub aadhaar_face_image: String,
    /// Base64 live camera capture.
    #[serde(rename = "liveImage")]
    pub live_image: String,
}

/// Flat JSON rendering of a [`ComparisonResult`].
///
/// Success carries `similarity` (2dp), `match`, `threshold` and
/// `raw_similarity` (4dp); failure carries only `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompareResponse {
    pub success: bool,
    /// Similarity percent in [0, 100], 2 decimal places.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub is_match: Option<bool>,
    /// Match threshold in percent.
    #[serde(
        serialize_with = "serialize_threshold",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub threshold: Option<f64>,
    /// Cosine similarity in [-1, 1], 4 decimal places.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompareResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            similarity: None,
            is_match: None,
            threshold: None,
            raw_similarity: None,
            error: Some(message.into()),
        }
    }
}

impl From<&ComparisonResult> for CompareResponse {
    fn from(result: &ComparisonResult) -> Self {
        match result {
            ComparisonResult::Success(outcome) => Self {
                success: true,
                similarity: Some(round_to(outcome.similarity_percent(), 2)),
                is_match: Some(outcome.is_match()),
                threshold: Some(outcome.threshold()),
                raw_similarity: Some(round_to(outcome.raw_similarity(), 4)),
                error: None,
            },
            ComparisonResult::Failure { reason } => Self::error(reason.clone()),
        }
    }
}

impl From<ComparisonResult> for CompareResponse {
    fn from(result: ComparisonResult) -> Self {
        Self::from(&result)
    }
}

/// Whole-percent thresholds go out as integers (`75`, not `75.0`).
fn serialize_threshold<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => serializer.serialize_i64(*v as i64),
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}
