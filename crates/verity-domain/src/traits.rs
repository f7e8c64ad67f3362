//! Trait definitions for storage
//!
//! These traits define the boundary between the engine's logic and its
//! persistence layer. The SQLite implementation lives in `verity-store`.

use crate::confidence::ConfidenceReport;
use crate::error::Fault;
use crate::evidence::{Counterclaim, Evidence};
use crate::ids::{ClaimId, CounterclaimId, EvidenceId, SignalId};
use crate::method::{Attribution, Method};
use crate::provenance::{ObjectKind, ReadOptions};
use crate::signal::PlayfulSignal;
use crate::transparency::TransparencyRecord;
use crate::Claim;

/// Append-only graph of claims and the objects attached to them
///
/// Every write verifies the object's signature before persisting it.
/// Writes are keyed by the client-supplied id: resubmitting an object with
/// the same id and signature returns the stored object unchanged.
pub trait ProvenanceStore: Send + Sync {
    /// Error type for store operations
    type Error: Fault + std::error::Error + Send + Sync + 'static;

    /// Store a root claim or a revision of an existing claim
    fn put_claim(&self, claim: Claim) -> Result<Claim, Self::Error>;

    /// Attach evidence to a live claim
    fn put_evidence(&self, evidence: Evidence) -> Result<Evidence, Self::Error>;

    /// Attach a counterclaim to a live claim
    fn put_counterclaim(&self, counterclaim: Counterclaim) -> Result<Counterclaim, Self::Error>;

    /// Attach a method to a live claim
    fn put_method(&self, method: Method) -> Result<Method, Self::Error>;

    /// Attach an attribution to a live claim
    fn put_attribution(&self, attribution: Attribution) -> Result<Attribution, Self::Error>;

    /// Get a claim with its reference lists and active reports filled in
    fn get_claim(&self, id: ClaimId, opts: ReadOptions) -> Result<Option<Claim>, Self::Error>;

    /// Get one evidence item
    fn get_evidence(&self, id: EvidenceId, opts: ReadOptions) -> Result<Option<Evidence>, Self::Error>;

    /// Get one counterclaim
    fn get_counterclaim(
        &self,
        id: CounterclaimId,
        opts: ReadOptions,
    ) -> Result<Option<Counterclaim>, Self::Error>;

    /// Evidence attached to a claim, oldest first
    fn get_evidence_for_claim(&self, claim_id: ClaimId, opts: ReadOptions) -> Result<Vec<Evidence>, Self::Error>;

    /// Counterclaims attached to a claim, oldest first
    fn get_counterclaims_for_claim(
        &self,
        claim_id: ClaimId,
        opts: ReadOptions,
    ) -> Result<Vec<Counterclaim>, Self::Error>;

    /// Methods attached to a claim, oldest first
    fn get_methods_for_claim(&self, claim_id: ClaimId, opts: ReadOptions) -> Result<Vec<Method>, Self::Error>;

    /// Attributions attached to a claim, oldest first
    fn get_attributions_for_claim(
        &self,
        claim_id: ClaimId,
        opts: ReadOptions,
    ) -> Result<Vec<Attribution>, Self::Error>;

    /// Ancestors of a claim, oldest first, found by walking `prev_id`
    ///
    /// Soft-deleted ancestors are included so history stays auditable.
    fn get_lineage(&self, id: ClaimId) -> Result<Vec<Claim>, Self::Error>;

    /// Newest live version in the revision chain containing `id`
    fn current_version(&self, id: ClaimId) -> Result<Claim, Self::Error>;

    /// Soft-delete an object. Returns false if it was already deleted.
    fn mark_deleted(&self, kind: ObjectKind, id: &str, actor: &str) -> Result<bool, Self::Error>;

    /// Query claims matching criteria
    fn query_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, Self::Error>;
}

/// Reports, transparency records and signals kept beside the graph
pub trait LedgerStore: ProvenanceStore {
    /// Atomically deactivate the prior active report for the report's
    /// (claim, lens) pair, store the report as active with the next version,
    /// and append all records. Either everything is written or nothing is.
    fn activate_report(
        &self,
        report: ConfidenceReport,
        records: &[TransparencyRecord],
    ) -> Result<ConfidenceReport, Self::Error>;

    /// Active reports for a claim, at most one per lens
    fn active_reports(&self, claim_id: ClaimId) -> Result<Vec<ConfidenceReport>, Self::Error>;

    /// Every report ever produced for a (claim, lens) pair, oldest first
    fn report_history(&self, claim_id: ClaimId, lens_id: &str) -> Result<Vec<ConfidenceReport>, Self::Error>;

    /// Append one transparency record
    fn append_record(&self, record: &TransparencyRecord) -> Result<(), Self::Error>;

    /// Records mentioning a subject id, newest first
    fn records_for_subject(&self, subject: &str, limit: usize) -> Result<Vec<TransparencyRecord>, Self::Error>;

    /// Atomically store an accepted signal with its acceptance record.
    /// Returns false if the identical signal was already stored.
    fn put_signal(&self, signal: &PlayfulSignal, record: &TransparencyRecord) -> Result<bool, Self::Error>;

    /// Get one signal
    fn get_signal(&self, id: SignalId) -> Result<Option<PlayfulSignal>, Self::Error>;

    /// Accepted signals for a claim, oldest first
    fn signals_for_claim(&self, claim_id: ClaimId) -> Result<Vec<PlayfulSignal>, Self::Error>;
}

/// Query criteria for retrieving claims
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    /// Filter by topic tag
    pub topic: Option<String>,

    /// Substring match on title or statement
    pub text: Option<String>,

    /// Include soft-deleted claims
    pub include_deleted: bool,

    /// Skip versions that a live revision has superseded
    pub heads_only: bool,

    /// Maximum results to return
    pub limit: Option<usize>,
}
