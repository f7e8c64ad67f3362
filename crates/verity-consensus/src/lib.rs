//! Verity Consensus
//!
//! Pluggable lenses that score claims, and the orchestrator that runs them.
//!
//! Each lens produces a [`ConfidenceReport`](verity_domain::ConfidenceReport)
//! per claim. Reports from different lenses are never merged: every lens
//! keeps its own active report, and re-running a lens supersedes only its
//! own previous report.
//!
//! # Built-in lenses
//!
//! | Id | Evaluates |
//! |----|-----------|
//! | `L1_evidence_first` | Evidence quality and source reliability (log-odds) |
//! | `L2_expert_jury` | Calibration-weighted vote of a diversity-constrained panel |
//! | `L3_community_notes` | Elo-ranked pairwise helpfulness of community notes |
//! | `L4_market_signal` | Verified playful signals, influence capped at 2% |
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use verity_consensus::{ConsensusConfig, LensParams, LensRegistry, Orchestrator};
//! use verity_domain::ClaimId;
//! use verity_gatekeeper::RecordSigner;
//! use verity_store::SqliteStore;
//!
//! # async fn run(claim_id: ClaimId) -> Result<(), Box<dyn std::error::Error>> {
//! let signer = RecordSigner::ephemeral();
//! let store = Arc::new(SqliteStore::new("verity.db", signer.clone())?);
//! let orchestrator = Orchestrator::new(
//!     store,
//!     LensRegistry::with_default_lenses(),
//!     signer,
//!     ConsensusConfig::default(),
//! );
//!
//! let report = orchestrator
//!     .run_lens(claim_id, "L1_evidence_first", LensParams::default())
//!     .await?;
//! println!("score {:.2} (v{})", report.score, report.version);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
pub mod jury;
mod lens;
pub mod lenses;
mod orchestrator;
mod registry;

pub use config::ConsensusConfig;
pub use error::{ConsensusError, JuryError, LensError};
pub use jury::{JuryConstraints, Juror, JurySelector, Panel, Seat};
pub use lens::{
    CommunityNote, Comparison, JuryParams, Lens, LensContext, LensDescriptor, LensParams, LensResult, NoteStance,
    NotesParams,
};
pub use orchestrator::{DisputedClaim, Orchestrator};
pub use registry::LensRegistry;
