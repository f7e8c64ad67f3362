//! Playful signals - capped external inputs to the market-signal lens

use crate::ids::{ClaimId, SignalId};
use crate::impl_signable;
use serde::{Deserialize, Serialize};

/// Largest `weight_applied` any single signal may carry, and the largest
/// combined influence the market-signal lens may report
pub const MAX_SIGNAL_WEIGHT: f64 = 0.02;

/// Declared winning side of the dispute that produced a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerSide {
    /// The side arguing for the claim
    Pro,
    /// The side arguing against the claim
    Con,
    /// No winner
    Draw,
}

impl WinnerSide {
    /// Value of the side on the [0, 1] truth scale
    pub fn value(&self) -> f64 {
        match self {
            WinnerSide::Pro => 1.0,
            WinnerSide::Con => 0.0,
            WinnerSide::Draw => 0.5,
        }
    }

    /// Get the side name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            WinnerSide::Pro => "pro",
            WinnerSide::Con => "con",
            WinnerSide::Draw => "draw",
        }
    }
}

/// Outcome of the source's verification of a dispute result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Result verified automatically
    Verified,
    /// Result awaiting manual review
    ManualReview,
    /// Result not verified
    Unverified,
}

/// Verification metadata attached by the signal's source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalVerification {
    /// How the result was verified (e.g. "automated_scoring")
    pub method: String,

    /// Verification outcome
    pub status: VerificationStatus,

    /// Source confidence in the verification [0.0, 1.0]
    pub confidence: f64,

    /// Dispute that produced the signal
    pub dispute_id: String,

    /// Game type of the dispute, if any
    #[serde(default)]
    pub game_type: Option<String>,
}

/// An externally produced, weight-capped input bearing on one claim
///
/// Accepted signals are immutable. They never change a claim's score
/// directly; the market-signal lens reads them on its next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayfulSignal {
    /// Unique identifier
    pub id: SignalId,

    /// The claim the dispute was about
    pub claim_id: ClaimId,

    /// The argument or side the dispute was fought over: the claim itself,
    /// or one of its evidence items or counterclaims
    pub argument_id: String,

    /// Declared winner
    pub winner_side: WinnerSide,

    /// Verification metadata
    pub verification: SignalVerification,

    /// Influence weight requested by the source, at most [`MAX_SIGNAL_WEIGHT`]
    pub weight_applied: f64,

    /// Hex-encoded Ed25519 public key of the source
    pub author_key: String,

    /// Hex-encoded signature over the canonical payload
    #[serde(default)]
    pub signature: String,

    /// Creation time (Unix millis)
    pub created_at: u64,
}

#[derive(Serialize)]
struct SignalPayload<'a> {
    id: &'a SignalId,
    claim_id: &'a ClaimId,
    argument_id: &'a str,
    winner_side: WinnerSide,
    verification: &'a SignalVerification,
    weight_applied: f64,
    author_key: &'a str,
    created_at: u64,
}

impl PlayfulSignal {
    /// Create an unsigned signal
    pub fn new(
        id: SignalId,
        claim_id: ClaimId,
        argument_id: impl Into<String>,
        winner_side: WinnerSide,
        verification: SignalVerification,
        weight_applied: f64,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            claim_id,
            argument_id: argument_id.into(),
            winner_side,
            verification,
            weight_applied,
            author_key: String::new(),
            signature: String::new(),
            created_at,
        }
    }

    /// Whether the source verified the dispute result
    pub fn is_verified(&self) -> bool {
        self.verification.status == VerificationStatus::Verified
    }

    fn payload(&self) -> SignalPayload<'_> {
        SignalPayload {
            id: &self.id,
            claim_id: &self.claim_id,
            argument_id: &self.argument_id,
            winner_side: self.winner_side,
            verification: &self.verification,
            weight_applied: self.weight_applied,
            author_key: &self.author_key,
            created_at: self.created_at,
        }
    }
}

impl_signable!(PlayfulSignal, "playful_signal");
