//! Community notes lens: Elo-ranked pairwise helpfulness

use crate::error::LensError;
use crate::lens::{Lens, LensContext, LensDescriptor, LensResult};
use serde_json::json;
use std::collections::BTreeMap;

/// Lens id
pub const COMMUNITY_NOTES_ID: &str = "L3_community_notes";

const INITIAL_RATING: f64 = 1500.0;
const K_FACTOR: f64 = 32.0;

/// Expected score of `a` against `b`
fn expected(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

/// Rating mapped to [0, 1]; 1500 maps to 0.5
fn helpfulness(rating: f64) -> f64 {
    expected(rating, INITIAL_RATING)
}

/// Replays pairwise comparisons into Elo ratings and takes the
/// helpfulness-weighted stance of the notes
#[derive(Debug, Clone)]
pub struct CommunityNotesLens {
    descriptor: LensDescriptor,
}

impl CommunityNotesLens {
    /// Create the lens
    pub fn new() -> Self {
        Self {
            descriptor: LensDescriptor::new(
                COMMUNITY_NOTES_ID,
                "Community Notes",
                "Pairwise comparison and Elo ranking of community assessments",
                0.2,
            ),
        }
    }
}

impl Default for CommunityNotesLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for CommunityNotesLens {
    fn descriptor(&self) -> &LensDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, ctx: &LensContext) -> Result<LensResult, LensError> {
        let Some(params) = ctx.params.notes.as_ref().filter(|p| !p.notes.is_empty()) else {
            return Ok(LensResult::low_confidence("No community notes submitted"));
        };

        let mut ratings: BTreeMap<&str, f64> = BTreeMap::new();
        for note in &params.notes {
            if ratings.insert(note.id.as_str(), INITIAL_RATING).is_some() {
                return Err(LensError::InvalidParams(format!("duplicate note id {}", note.id)));
            }
        }

        for comparison in &params.comparisons {
            if comparison.winner == comparison.loser {
                return Err(LensError::InvalidParams(format!(
                    "note {} compared against itself",
                    comparison.winner
                )));
            }
            let (Some(&winner), Some(&loser)) = (
                ratings.get(comparison.winner.as_str()),
                ratings.get(comparison.loser.as_str()),
            ) else {
                return Err(LensError::InvalidParams(format!(
                    "comparison references unknown note ({} vs {})",
                    comparison.winner, comparison.loser
                )));
            };
            let gain = K_FACTOR * (1.0 - expected(winner, loser));
            ratings.insert(comparison.winner.as_str(), winner + gain);
            ratings.insert(comparison.loser.as_str(), loser - gain);
        }

        let mut weighted = 0.0;
        let mut total = 0.0;
        let mut rated = Vec::with_capacity(params.notes.len());
        for note in &params.notes {
            let rating = ratings.get(note.id.as_str()).copied().unwrap_or(INITIAL_RATING);
            let h = helpfulness(rating);
            weighted += h * note.stance.value();
            total += h;
            rated.push((note, rating, h));
        }
        let score = if total > 0.0 { weighted / total } else { 0.5 };
        let n = params.comparisons.len() as f64;
        let confidence = n / (n + 10.0);

        let dissent = rated
            .iter()
            .filter(|(note, _, _)| (note.stance.value() - 0.5) * (score - 0.5) < 0.0)
            .map(|(note, _, h)| format!("Note {} (helpfulness {:.2}) disagrees with the consensus", note.id, h))
            .collect();

        let notes: Vec<_> = rated
            .iter()
            .map(|(note, rating, h)| {
                json!({"note_id": note.id, "stance": note.stance, "rating": rating, "helpfulness": h})
            })
            .collect();

        let mut result = LensResult::new(score, confidence)
            .with_input("notes", notes)
            .with_input("comparisons", params.comparisons.len())
            .with_input("k_factor", K_FACTOR);
        result.dissenting_views = dissent;
        Ok(result)
    }
}
