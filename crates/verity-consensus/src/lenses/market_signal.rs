//! Market signal lens over accepted playful signals

use crate::error::LensError;
use crate::lens::{Lens, LensContext, LensDescriptor, LensResult};
use verity_domain::{WinnerSide, MAX_SIGNAL_WEIGHT};

/// Lens id
pub const MARKET_SIGNAL_ID: &str = "L4_market_signal";

/// Signal count at which sample size stops limiting confidence
const FULL_SAMPLE: f64 = 10.0;

/// Verification-confidence-weighted outcome of verified signals, with the
/// summed influence capped at [`MAX_SIGNAL_WEIGHT`]
#[derive(Debug, Clone)]
pub struct MarketSignalLens {
    descriptor: LensDescriptor,
}

impl MarketSignalLens {
    /// Create the lens
    pub fn new() -> Self {
        Self {
            descriptor: LensDescriptor::new(
                MARKET_SIGNAL_ID,
                "Market Signal",
                "Prediction market signals with capped influence (max 2%)",
                0.05,
            ),
        }
    }
}

impl Default for MarketSignalLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for MarketSignalLens {
    fn descriptor(&self) -> &LensDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, ctx: &LensContext) -> Result<LensResult, LensError> {
        let verified: Vec<_> = ctx.signals.iter().filter(|s| s.is_verified()).collect();
        let unverified = ctx.signals.len() - verified.len();

        let raw_influence: f64 = verified.iter().map(|s| s.weight_applied.max(0.0)).sum();
        let capped_influence = raw_influence.min(MAX_SIGNAL_WEIGHT);

        let mut pro = 0usize;
        let mut con = 0usize;
        let mut draw = 0usize;
        let mut weighted = 0.0;
        let mut total = 0.0;
        for signal in &verified {
            match signal.winner_side {
                WinnerSide::Pro => pro += 1,
                WinnerSide::Con => con += 1,
                WinnerSide::Draw => draw += 1,
            }
            let c = signal.verification.confidence.clamp(0.0, 1.0);
            weighted += c * signal.winner_side.value();
            total += c;
        }

        let mut result = if verified.is_empty() {
            LensResult::low_confidence("No verified signals for this claim")
        } else {
            let n = verified.len() as f64;
            let score = if total > 0.0 { weighted / total } else { 0.5 };
            let confidence = (n / FULL_SAMPLE).min(1.0) * (total / n);
            let mut result = LensResult::new(score, confidence);
            let minority = if score >= 0.5 { con } else { pro };
            if minority > 0 {
                result.dissenting_views.push(format!(
                    "{} verified signal(s) favoured the {} side",
                    minority,
                    if score >= 0.5 { "con" } else { "pro" }
                ));
            }
            result
        };

        result = result
            .with_input("cappedInfluence", capped_influence)
            .with_input("rawInfluence", raw_influence)
            .with_input("verified", verified.len())
            .with_input("unverified", unverified)
            .with_input("pro", pro)
            .with_input("con", con)
            .with_input("draw", draw);
        Ok(result)
    }
}
