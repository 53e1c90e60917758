//! Process-pipe mode: one JSON request on stdin, one JSON result on stdout.

use anyhow::Result;
use facematch_core::{CompareResponse, ComparisonPipeline, ComparisonResult, FaceEmbedder, MatchPolicy};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;
use std::io::{Read, Write};

const AADHAAR_FIELD: &str = "aadhaarFaceImage";
const LIVE_FIELD: &str = "liveImage";

/// Request as read from stdin. Fields are untyped so that a missing or
/// mistyped image still produces a result object instead of a parse error.
#[derive(Debug, Deserialize)]
struct PipeRequest {
    #[serde(rename = "aadhaarFaceImage", default)]
    aadhaar_face_image: Option<Value>,
    #[serde(rename = "liveImage", default)]
    live_image: Option<Value>,
}

/// One image field of a [`PipeRequest`].
#[derive(Debug, PartialEq)]
enum ImageField {
    /// Absent, null, or an empty value (`""`, `0`, `false`, `[]`, `{}`).
    Missing,
    Payload(String),
    /// A non-empty value that is not a string.
    NotText(&'static str),
}

impl ImageField {
    fn classify(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => ImageField::Missing,
            Some(Value::String(s)) if s.is_empty() => ImageField::Missing,
            Some(Value::String(s)) => ImageField::Payload(s),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => ImageField::Missing,
            Some(Value::Array(a)) if a.is_empty() => ImageField::Missing,
            Some(Value::Object(o)) if o.is_empty() => ImageField::Missing,
            Some(Value::Bool(true)) => ImageField::NotText("boolean"),
            Some(Value::Number(_)) => ImageField::NotText("number"),
            Some(Value::Array(_)) => ImageField::NotText("array"),
            Some(Value::Object(_)) => ImageField::NotText("object"),
        }
    }
}

/// Exit status of one pipe invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeStatus {
    /// A result object was produced (success or failure).
    Completed,
    /// The request could not be processed at all.
    Aborted,
}

impl PipeStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            PipeStatus::Completed => 0,
            PipeStatus::Aborted => 1,
        }
    }
}

/// Run one comparison from `input` to `output`.
///
/// `load_embedder` runs only once the request is known to be valid, so a
/// malformed request never pays for model loading. Exactly one JSON line is
/// written to `output` in every case; only I/O errors on `output` propagate.
pub fn run<E, F, LE>(
    mut input: impl Read,
    mut output: impl Write,
    policy: MatchPolicy,
    load_embedder: F,
) -> Result<PipeStatus>
where
    E: FaceEmbedder,
    F: FnOnce() -> Result<E, LE>,
    LE: Display,
{
    let mut raw = String::new();
    let request = match input.read_to_string(&mut raw) {
        Ok(_) => serde_json::from_str::<PipeRequest>(&raw).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let request = match request {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(error = %e, "unreadable request");
            return abort(&mut output, e);
        }
    };

    let aadhaar = ImageField::classify(request.aadhaar_face_image);
    let live = ImageField::classify(request.live_image);

    let (aadhaar, live) = match (aadhaar, live) {
        (ImageField::Payload(a), ImageField::Payload(l)) => (a, l),
        (ImageField::Missing, _) | (_, ImageField::Missing) => {
            tracing::warn!("request is missing an image");
            return complete(&mut output, ComparisonResult::failure("Both images are required"));
        }
        (ImageField::NotText(kind), _) => return not_text(&mut output, AADHAAR_FIELD, kind),
        (_, ImageField::NotText(kind)) => return not_text(&mut output, LIVE_FIELD, kind),
    };

    let embedder = match load_embedder() {
        Ok(embedder) => embedder,
        Err(e) => {
            tracing::error!(error = %e, "failed to load face models");
            return abort(&mut output, e);
        }
    };

    let result = ComparisonPipeline::new(embedder, policy).compare(&aadhaar, &live);
    complete(&mut output, result)
}

fn complete(output: &mut impl Write, result: ComparisonResult) -> Result<PipeStatus> {
    write_line(output, &CompareResponse::from(result))?;
    Ok(PipeStatus::Completed)
}

fn not_text(output: &mut impl Write, field: &str, kind: &str) -> Result<PipeStatus> {
    tracing::warn!(field, kind, "image field is not a string");
    let result = ComparisonResult::failure(format!(
        "Face comparison failed: {field} must be a base64 string, got {kind}"
    ));
    complete(output, result)
}

fn abort(output: &mut impl Write, cause: impl Display) -> Result<PipeStatus> {
    let response = CompareResponse::error(format!("Error processing request: {cause}"));
    write_line(output, &response)?;
    Ok(PipeStatus::Aborted)
}

fn write_line(output: &mut impl Write, response: &CompareResponse) -> Result<()> {
    serde_json::to_writer(&mut *output, response)?;
    output.write_all(b"\n")?;
    output.flush()?;
    Ok(())
}
