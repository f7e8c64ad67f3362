//! Bayesian evidence-first lens

use super::sigmoid;
use crate::error::LensError;
use crate::lens::{Lens, LensContext, LensDescriptor, LensResult};
use serde_json::json;
use verity_domain::{EvidenceKind, Stance};

/// Lens id
pub const EVIDENCE_FIRST_ID: &str = "L1_evidence_first";

/// Log-odds scale applied to each evidence contribution
const EVIDENCE_SCALE: f64 = 2.0;

/// Log-odds penalty per unit of counterclaim strength
const COUNTERCLAIM_SCALE: f64 = 0.5;

/// Reliability of each evidence kind
fn kind_weight(kind: EvidenceKind) -> f64 {
    match kind {
        EvidenceKind::PrimarySource => 1.0,
        EvidenceKind::Dataset => 0.95,
        EvidenceKind::SecondarySource => 0.8,
        EvidenceKind::Transcript => 0.75,
        EvidenceKind::Pdf => 0.7,
        EvidenceKind::Url => 0.6,
        EvidenceKind::TertiarySource => 0.5,
    }
}

/// Accumulates log-odds from a 0.5 prior over live evidence and active
/// counterclaims
#[derive(Debug, Clone)]
pub struct EvidenceFirstLens {
    descriptor: LensDescriptor,
}

impl EvidenceFirstLens {
    /// Create the lens
    pub fn new() -> Self {
        Self {
            descriptor: LensDescriptor::new(
                EVIDENCE_FIRST_ID,
                "Evidence-First (Bayesian)",
                "Bayesian evaluation based on evidence quality and source reliability",
                0.4,
            ),
        }
    }
}

impl Default for EvidenceFirstLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for EvidenceFirstLens {
    fn descriptor(&self) -> &LensDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, ctx: &LensContext) -> Result<LensResult, LensError> {
        let mut log_odds = 0.0;
        let mut mass = 0.0;
        let mut contributions = Vec::new();
        let mut dissent = Vec::new();
        let (mut supporting, mut contradicting, mut neutral) = (0usize, 0usize, 0usize);

        for evidence in ctx.evidence.iter().filter(|e| !e.is_deleted()) {
            if !(0.0..=1.0).contains(&evidence.quality_score) {
                return Err(LensError::InvalidParams(format!(
                    "evidence {} has quality {} outside [0, 1]",
                    evidence.id, evidence.quality_score
                )));
            }
            let strength = evidence.quality_score * kind_weight(evidence.kind);
            mass += strength;

            let delta = match evidence.stance {
                Stance::Supports => {
                    supporting += 1;
                    strength * EVIDENCE_SCALE
                }
                Stance::Contradicts => {
                    contradicting += 1;
                    dissent.push(format!(
                        "Evidence {} ({}) contradicts the claim",
                        evidence.id, evidence.source
                    ));
                    -strength * EVIDENCE_SCALE
                }
                Stance::Mixed | Stance::Unclear | Stance::Neutral => {
                    neutral += 1;
                    0.0
                }
            };
            log_odds += delta;
            contributions.push(json!({
                "evidence_id": evidence.id.to_string(),
                "kind": evidence.kind.as_str(),
                "stance": evidence.stance.as_str(),
                "quality": evidence.quality_score,
                "log_odds_delta": delta,
            }));
        }

        let active: Vec<_> = ctx
            .counterclaims
            .iter()
            .filter(|c| c.is_active())
            .collect();
        for counterclaim in &active {
            let delta = -counterclaim.strength.clamp(0.0, 1.0) * COUNTERCLAIM_SCALE;
            log_odds += delta;
            dissent.push(format!("Counterclaim {}: {}", counterclaim.id, counterclaim.statement));
            contributions.push(json!({
                "counterclaim_id": counterclaim.id.to_string(),
                "strength": counterclaim.strength,
                "log_odds_delta": delta,
            }));
        }

        if supporting + contradicting + neutral == 0 {
            dissent.insert(0, "No evidence attached; score reflects the uninformed prior".to_string());
        }

        let score = sigmoid(log_odds);
        let confidence = 1.0 - 1.0 / (mass + 1.0);

        let mut result = LensResult::new(score, confidence)
            .with_input("log_odds", log_odds)
            .with_input("evidence_mass", mass)
            .with_input("supporting", supporting)
            .with_input("contradicting", contradicting)
            .with_input("neutral", neutral)
            .with_input("active_counterclaims", active.len())
            .with_input("contributions", contributions);
        result.dissenting_views = dissent;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use verity_domain::{Claim, ClaimId, Counterclaim, CounterclaimId, Evidence, EvidenceId};

    fn context() -> LensContext {
        LensContext::for_claim(Claim::new(ClaimId::new(), "Title", "Statement", Vec::new(), 1))
    }

    fn evidence(claim_id: ClaimId, kind: EvidenceKind, stance: Stance, quality: f64) -> Evidence {
        Evidence::new(EvidenceId::new(), claim_id, kind, "https://example.org", stance, quality, 1)
    }

    #[test]
    fn test_zero_evidence_is_neutral() {
        let result = EvidenceFirstLens::new().evaluate(&context()).unwrap();
        assert_eq!(result.score, 0.5);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.dissenting_views.is_empty());
    }

    #[test]
    fn test_primary_support() {
        let mut ctx = context();
        let claim_id = ctx.claim.id;
        ctx.evidence
            .push(evidence(claim_id, EvidenceKind::PrimarySource, Stance::Supports, 1.0));

        let result = EvidenceFirstLens::new().evaluate(&ctx).unwrap();
        assert!((result.score - sigmoid(2.0)).abs() < 1e-12);
        assert!((result.confidence - 0.5).abs() < 1e-12);
        assert!(result.dissenting_views.is_empty());
    }

    #[test]
    fn test_contradiction_and_counterclaim_lower_score() {
        let mut ctx = context();
        let claim_id = ctx.claim.id;
        ctx.evidence.push(evidence(claim_id, EvidenceKind::Url, Stance::Contradicts, 0.8));
        ctx.counterclaims
            .push(Counterclaim::new(CounterclaimId::new(), claim_id, "Not so", 1.0, 1));

        let result = EvidenceFirstLens::new().evaluate(&ctx).unwrap();
        assert!(result.score < 0.5);
        assert_eq!(result.dissenting_views.len(), 2);
        assert_eq!(result.inputs["active_counterclaims"], json!(1));
    }

    #[test]
    fn test_quality_out_of_range() {
        let mut ctx = context();
        let claim_id = ctx.claim.id;
        ctx.evidence.push(evidence(claim_id, EvidenceKind::Pdf, Stance::Supports, 1.5));
        assert!(matches!(
            EvidenceFirstLens::new().evaluate(&ctx),
            Err(LensError::InvalidParams(_))
        ));
    }

    fn arb_kind() -> impl Strategy<Value = EvidenceKind> {
        prop_oneof![
            Just(EvidenceKind::Url),
            Just(EvidenceKind::Pdf),
            Just(EvidenceKind::Transcript),
            Just(EvidenceKind::Dataset),
            Just(EvidenceKind::PrimarySource),
            Just(EvidenceKind::SecondarySource),
            Just(EvidenceKind::TertiarySource),
        ]
    }

    fn arb_stance() -> impl Strategy<Value = Stance> {
        prop_oneof![
            Just(Stance::Supports),
            Just(Stance::Contradicts),
            Just(Stance::Neutral),
            Just(Stance::Mixed),
        ]
    }

    proptest! {
        #[test]
        fn prop_support_never_lowers_score(
            existing in prop::collection::vec((arb_kind(), arb_stance(), 0.0f64..=1.0), 0..12),
            kind in arb_kind(),
            quality in 0.0f64..=1.0,
        ) {
            let mut ctx = context();
            let claim_id = ctx.claim.id;
            for (k, s, q) in existing {
                ctx.evidence.push(evidence(claim_id, k, s, q));
            }
            let lens = EvidenceFirstLens::new();
            let before = lens.evaluate(&ctx).unwrap();

            ctx.evidence.push(evidence(claim_id, kind, Stance::Supports, quality));
            let after = lens.evaluate(&ctx).unwrap();

            prop_assert!(after.score >= before.score);
            prop_assert!(after.confidence >= before.confidence);
            prop_assert!((0.0..=1.0).contains(&after.score));
        }

        #[test]
        fn prop_contradiction_never_raises_score(
            existing in prop::collection::vec((arb_kind(), arb_stance(), 0.0f64..=1.0), 0..12),
            counterclaims in prop::collection::vec(0.0f64..=1.0, 0..3),
            kind in arb_kind(),
            quality in 0.0f64..=1.0,
        ) {
            let mut ctx = context();
            let claim_id = ctx.claim.id;
            for (k, s, q) in existing {
                ctx.evidence.push(evidence(claim_id, k, s, q));
            }
            for strength in counterclaims {
                ctx.counterclaims
                    .push(Counterclaim::new(CounterclaimId::new(), claim_id, "Competing", strength, 1));
            }
            let lens = EvidenceFirstLens::new();
            let before = lens.evaluate(&ctx).unwrap();

            ctx.evidence.push(evidence(claim_id, kind, Stance::Contradicts, quality));
            let after = lens.evaluate(&ctx).unwrap();

            prop_assert!(after.score <= before.score);
            prop_assert!(after.confidence >= before.confidence);
            prop_assert!((0.0..=1.0).contains(&after.score));
        }
    }
}
