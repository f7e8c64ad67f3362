//! Expert jury lens

use crate::error::LensError;
use crate::jury::{JurySelector, Panel};
use crate::lens::{Lens, LensContext, LensDescriptor, LensResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Lens id
pub const EXPERT_JURY_ID: &str = "L2_expert_jury";

/// How closely the panel agreed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusLevel {
    /// Every vote identical
    Unanimous,
    /// Agreement at least 0.8
    Strong,
    /// Agreement at least 0.6
    Moderate,
    /// Agreement at least 0.4
    Weak,
    /// Anything lower
    Divided,
}

impl ConsensusLevel {
    /// Classify from the weighted standard deviation of votes
    pub fn from_stddev(stddev: f64) -> Self {
        if stddev < 1e-9 {
            return ConsensusLevel::Unanimous;
        }
        let agreement = 1.0 - 2.0 * stddev;
        if agreement >= 0.8 {
            ConsensusLevel::Strong
        } else if agreement >= 0.6 {
            ConsensusLevel::Moderate
        } else if agreement >= 0.4 {
            ConsensusLevel::Weak
        } else {
            ConsensusLevel::Divided
        }
    }

    /// Level name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusLevel::Unanimous => "unanimous",
            ConsensusLevel::Strong => "strong",
            ConsensusLevel::Moderate => "moderate",
            ConsensusLevel::Weak => "weak",
            ConsensusLevel::Divided => "divided",
        }
    }
}

/// Convenes a diversity-constrained panel and takes its
/// calibration-weighted vote
#[derive(Debug, Clone)]
pub struct ExpertJuryLens {
    descriptor: LensDescriptor,
    selector: JurySelector,
}

impl ExpertJuryLens {
    /// Create the lens
    pub fn new() -> Self {
        Self {
            descriptor: LensDescriptor::new(
                EXPERT_JURY_ID,
                "Expert Jury",
                "Diversity-constrained expert panel with calibration weighting",
                0.35,
            ),
            selector: JurySelector::new(),
        }
    }
}

impl Default for ExpertJuryLens {
    fn default() -> Self {
        Self::new()
    }
}

fn panel_value(panel: &Panel) -> Result<serde_json::Value, LensError> {
    serde_json::to_value(panel).map_err(|e| LensError::Unavailable(format!("panel snapshot: {}", e)))
}

impl Lens for ExpertJuryLens {
    fn descriptor(&self) -> &LensDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, ctx: &LensContext) -> Result<LensResult, LensError> {
        let Some(params) = &ctx.params.jury else {
            return Ok(LensResult::low_confidence("No jury parameters supplied; no panel convened"));
        };
        if params.candidates.is_empty() {
            return Ok(LensResult::low_confidence("Empty candidate pool; no panel convened")
                .with_input("panel_size", 0));
        }
        if let Some((actor, vote)) = params.votes.iter().find(|(_, v)| !(0.0..=1.0).contains(*v)) {
            return Err(LensError::InvalidParams(format!(
                "vote {} from {} is outside [0, 1]",
                vote, actor
            )));
        }

        let panel = self
            .selector
            .select_jury(ctx.claim.id, &params.candidates, &params.constraints)?;

        let mut voters = Vec::new();
        let mut abstentions = Vec::new();
        for seat in &panel.jurors {
            match params.votes.get(&seat.juror.actor_id) {
                Some(vote) => voters.push((seat, *vote)),
                None => abstentions.push(seat.juror.actor_id.clone()),
            }
        }
        // Votes from actors without a seat carry no weight
        let unseated: Vec<String> = params
            .votes
            .keys()
            .filter(|actor| panel.seat(actor).is_none())
            .cloned()
            .collect();

        let total_weight: f64 = voters.iter().map(|(seat, _)| seat.weight).sum();
        if voters.is_empty() || total_weight <= 0.0 {
            let mut result = LensResult::low_confidence("No weighted votes from the seated panel")
                .with_input("panel", panel_value(&panel)?)
                .with_input("abstentions", abstentions)
                .with_input("unseated_votes", unseated);
            result.panel = Some(panel);
            return Ok(result);
        }

        let score = voters.iter().map(|(seat, v)| seat.weight * v).sum::<f64>() / total_weight;
        let variance = voters
            .iter()
            .map(|(seat, v)| seat.weight * (v - score).powi(2))
            .sum::<f64>()
            / total_weight;
        let stddev = variance.sqrt();
        let coverage = (voters.len() as f64 / params.constraints.panel_size as f64).min(1.0);
        let confidence = (1.0 - 2.0 * stddev).clamp(0.0, 1.0) * coverage;
        let level = ConsensusLevel::from_stddev(stddev);

        let dissent = voters
            .iter()
            .filter(|(_, v)| (v - 0.5) * (score - 0.5) < 0.0)
            .map(|(seat, v)| {
                format!(
                    "Juror {} ({}) voted {:.2} against the panel score {:.2}",
                    seat.juror.actor_id, seat.juror.diversity_cluster, v, score
                )
            })
            .collect();

        let votes: Vec<_> = voters
            .iter()
            .map(|(seat, v)| json!({"actor_id": seat.juror.actor_id, "vote": v, "weight": seat.weight}))
            .collect();

        let mut result = LensResult::new(score, confidence)
            .with_input("panel", panel_value(&panel)?)
            .with_input("votes", votes)
            .with_input("abstentions", abstentions)
            .with_input("unseated_votes", unseated)
            .with_input("total_weight", total_weight)
            .with_input("weighted_stddev", stddev)
            .with_input("consensus_level", level.as_str());
        result.dissenting_views = dissent;
        result.panel = Some(panel);
        Ok(result)
    }
}
