//! Verity Domain Layer
//!
//! Core data model of the claim provenance and consensus engine. It defines
//! the signed graph objects, the reports and audit records derived from
//! them, the shared error taxonomy, and the storage traits every other
//! crate builds on.
//!
//! ## Key Concepts
//!
//! - **Claim**: a falsifiable, signed statement; edits create new versions
//!   chained through `prev_id` and `lineage`
//! - **Evidence / Counterclaim / Method / Attribution**: signed objects
//!   attached to exactly one claim
//! - **ConfidenceReport**: one lens's score for one claim; superseded, never
//!   deleted
//! - **TransparencyRecord**: signed explanation of a decision
//! - **PlayfulSignal**: capped external input to the market-signal lens
//!
//! ## Architecture
//!
//! - No I/O; only `uuid` and `serde` as dependencies
//! - Canonical signing payloads live beside the types they cover
//! - Infrastructure implements the traits in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim;
pub mod confidence;
pub mod error;
pub mod evidence;
pub mod ids;
pub mod method;
pub mod provenance;
pub mod signal;
pub mod signing;
pub mod traits;
pub mod transparency;

// Re-exports for convenience
pub use claim::Claim;
pub use confidence::{ConfidenceInterval, ConfidenceReport, INTERVAL_METHOD};
pub use error::{ErrorKind, Fault};
pub use evidence::{Counterclaim, CounterclaimStatus, Evidence, EvidenceKind, Stance};
pub use ids::{
    now_millis, AttributionId, ClaimId, CounterclaimId, EvidenceId, MethodId, RecordId, ReportId, SignalId,
};
pub use method::{Attribution, AttributionRole, Method, ValidationStatus};
pub use provenance::{ObjectKind, ReadOptions, Tombstone};
pub use signal::{PlayfulSignal, SignalVerification, VerificationStatus, WinnerSide, MAX_SIGNAL_WEIGHT};
pub use signing::Signable;
pub use traits::{ClaimQuery, LedgerStore, ProvenanceStore};
pub use transparency::{RecordType, TransparencyRecord};
