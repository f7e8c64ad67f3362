//! Confidence intervals and reports

use crate::ids::{ClaimId, ReportId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Interval method name used for every lens report
pub const INTERVAL_METHOD: &str = "confidence_interval";

/// Confidence interval representing [lower, upper] bounds around a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound [0, 1]
    pub lower: f64,
    /// Upper bound [0, 1]
    pub upper: f64,
    /// How the interval was derived
    pub method: String,
}

impl ConfidenceInterval {
    /// Derive the interval for a lens result: the score widened by half of
    /// the missing confidence on each side, clipped to [0, 1]
    pub fn from_score(score: f64, confidence: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        let half_width = (1.0 - confidence.clamp(0.0, 1.0)) / 2.0;
        Self {
            lower: (score - half_width).max(0.0),
            upper: (score + half_width).min(1.0),
            method: INTERVAL_METHOD.to_string(),
        }
    }
}

/// The output of one lens run against one claim
///
/// Re-running a lens supersedes the previous report (it becomes inactive)
/// but never deletes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Unique identifier
    pub id: ReportId,

    /// The claim that was scored
    pub claim_id: ClaimId,

    /// The lens that produced the report
    pub lens_id: String,

    /// Score [0, 1]
    pub score: f64,

    /// Lens confidence in its own score [0, 1]
    pub confidence: f64,

    /// Interval around the score
    pub interval: ConfidenceInterval,

    /// Raw inputs the lens used
    pub inputs: BTreeMap<String, Value>,

    /// Dissenting views and explanatory notes
    pub dissenting_views: Vec<String>,

    /// When the report was computed (Unix millis)
    pub computed_at: u64,

    /// Version within the (claim, lens) pair, starting at 1
    pub version: u32,

    /// Whether this is the current report for the pair
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_score() {
        let ci = ConfidenceInterval::from_score(0.75, 0.85);
        assert!((ci.lower - 0.675).abs() < 1e-9);
        assert!((ci.upper - 0.825).abs() < 1e-9);
        assert_eq!(ci.method, INTERVAL_METHOD);

        let ci = ConfidenceInterval::from_score(0.95, 0.0);
        assert!((ci.lower - 0.45).abs() < 1e-9);
        assert_eq!(ci.upper, 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Derived intervals are always well-formed and contain the score
        #[test]
        fn test_from_score_well_formed(score in 0.0f64..=1.0, confidence in 0.0f64..=1.0) {
            let ci = ConfidenceInterval::from_score(score, confidence);
            prop_assert!(ci.lower >= 0.0 && ci.upper <= 1.0);
            prop_assert!(ci.lower <= ci.upper);
            prop_assert!(ci.lower <= score && score <= ci.upper);
        }
    }
}
