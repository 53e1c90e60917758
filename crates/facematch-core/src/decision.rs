//! Threshold policy: cosine similarity → percent confidence → verdict.

/// Default match cutoff on the percent scale.
///
/// 75% corresponds to a raw cosine similarity of 0.5. Recalibrate through
/// configuration rather than editing this value.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 75.0;

/// Lower and upper bound of the reported percent scale.
pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;

/// Map a cosine similarity onto the [0, 100] confidence scale.
///
/// Linear: -1 → 0, 0 → 50, 1 → 100. Out-of-range inputs clamp; NaN maps to 0.
pub fn similarity_to_percent(raw: f64) -> f64 {
    let percent = ((raw + 1.0) / 2.0) * PERCENT_MAX;
    if percent.is_nan() {
        return PERCENT_MIN;
    }
    percent.clamp(PERCENT_MIN, PERCENT_MAX)
}

/// Verdict for one similarity measurement, at full precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchDecision {
    pub similarity_percent: f64,
    pub is_match: bool,
    pub threshold: f64,
}

/// Fixed-threshold match policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Minimum similarity percent counted as a match (inclusive).
    pub threshold: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl MatchPolicy {
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn decide(&self, raw_similarity: f64) -> MatchDecision {
        let similarity_percent = similarity_to_percent(raw_similarity);
        MatchDecision {
            similarity_percent,
            is_match: similarity_percent >= self.threshold,
            threshold: self.threshold,
        }
    }
}

/// Round to `digits` decimal places for display.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
