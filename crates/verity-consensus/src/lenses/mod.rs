//! Built-in lenses

mod community_notes;
mod evidence_first;
mod expert_jury;
mod market_signal;

pub use community_notes::{CommunityNotesLens, COMMUNITY_NOTES_ID};
pub use evidence_first::{EvidenceFirstLens, EVIDENCE_FIRST_ID};
pub use expert_jury::{ConsensusLevel, ExpertJuryLens, EXPERT_JURY_ID};
pub use market_signal::{MarketSignalLens, MARKET_SIGNAL_ID};

/// Logistic function
pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
