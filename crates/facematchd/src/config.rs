use facematch_core::{EmbedderConfig, MatchPolicy, DEFAULT_MATCH_THRESHOLD};
use std::path::PathBuf;
use std::str::FromStr;

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the HTTP server binds to (default: 0.0.0.0:7860).
    pub listen_addr: String,
    /// Directory containing the buffalo_l ONNX model files.
    pub model_dir: PathBuf,
    /// Similarity percent at or above which two faces match.
    pub match_threshold: f64,
    /// Comparisons allowed to wait for the engine before callers block.
    pub queue_depth: usize,
    /// Maximum request body size in MiB.
    pub body_limit_mb: usize,
    /// ONNX Runtime intra-op threads per model session.
    pub intra_threads: usize,
}

impl Config {
    /// Load configuration from `FACEMATCH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            listen_addr: get("FACEMATCH_LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:7860".to_string()),
            model_dir: get("FACEMATCH_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(facematch_core::default_model_dir),
            match_threshold: parse_var::<f64>(&get, "FACEMATCH_MATCH_THRESHOLD").unwrap_or(DEFAULT_MATCH_THRESHOLD),
            queue_depth: parse_var::<usize>(&get, "FACEMATCH_QUEUE_DEPTH").filter(|&n| n > 0).unwrap_or(4),
            body_limit_mb: parse_var::<usize>(&get, "FACEMATCH_BODY_LIMIT_MB").unwrap_or(10),
            intra_threads: parse_var::<usize>(&get, "FACEMATCH_INTRA_THREADS").filter(|&n| n > 0).unwrap_or(2),
        }
    }

    pub fn embedder(&self) -> EmbedderConfig {
        EmbedderConfig {
            model_dir: self.model_dir.clone(),
            intra_threads: self.intra_threads,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy::with_threshold(self.match_threshold)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

fn parse_var<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|v| v.trim().parse().ok())
}
