//! Claim module - the fundamental unit of the provenance graph

use crate::confidence::ConfidenceReport;
use crate::ids::{AttributionId, ClaimId, CounterclaimId, EvidenceId, MethodId};
use crate::provenance::Tombstone;
use crate::impl_signable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// A falsifiable statement, signed by its author
///
/// Claims are immutable once signed. Editing a claim produces a new claim
/// whose `prev_id` points at the version it supersedes and whose `lineage`
/// lists every ancestor, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier of this version
    pub id: ClaimId,

    /// Short human-readable title
    pub title: String,

    /// The statement being asserted
    pub statement: String,

    /// Topic tags (kept sorted so the signing payload is stable)
    #[serde(default)]
    pub topic_tags: BTreeSet<String>,

    /// Hex-encoded Ed25519 public key of the author
    pub author_key: String,

    /// Hex-encoded signature over the canonical payload
    #[serde(default)]
    pub signature: String,

    /// Creation time (Unix millis)
    pub created_at: u64,

    /// Version number, 1 for a root claim
    pub version: u32,

    /// The version this claim supersedes
    #[serde(default)]
    pub prev_id: Option<ClaimId>,

    /// Ancestor ids, oldest first
    #[serde(default)]
    pub lineage: Vec<ClaimId>,

    /// Evidence attached to this claim (filled on read)
    #[serde(default)]
    pub evidence_refs: Vec<EvidenceId>,

    /// Counterclaims attached to this claim (filled on read)
    #[serde(default)]
    pub counterclaim_refs: Vec<CounterclaimId>,

    /// Methods attached to this claim (filled on read)
    #[serde(default)]
    pub method_refs: Vec<MethodId>,

    /// Attributions attached to this claim (filled on read)
    #[serde(default)]
    pub attribution_refs: Vec<AttributionId>,

    /// Latest active report per lens (filled on read)
    #[serde(default)]
    pub confidence_reports: Vec<ConfidenceReport>,

    /// Soft-delete marker
    #[serde(default)]
    pub deleted: Option<Tombstone>,
}

#[derive(Serialize)]
struct ClaimPayload<'a> {
    id: &'a ClaimId,
    title: &'a str,
    statement: &'a str,
    topic_tags: &'a BTreeSet<String>,
    author_key: &'a str,
    created_at: u64,
    version: u32,
    prev_id: &'a Option<ClaimId>,
    lineage: &'a [ClaimId],
}

impl Claim {
    /// Create an unsigned root claim (version 1, no lineage)
    pub fn new(
        id: ClaimId,
        title: impl Into<String>,
        statement: impl Into<String>,
        topic_tags: impl IntoIterator<Item = String>,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            statement: statement.into(),
            topic_tags: topic_tags.into_iter().collect(),
            author_key: String::new(),
            signature: String::new(),
            created_at,
            version: 1,
            prev_id: None,
            lineage: Vec::new(),
            evidence_refs: Vec::new(),
            counterclaim_refs: Vec::new(),
            method_refs: Vec::new(),
            attribution_refs: Vec::new(),
            confidence_reports: Vec::new(),
            deleted: None,
        }
    }

    /// Create an unsigned revision that supersedes this claim
    pub fn revise(
        &self,
        id: ClaimId,
        title: impl Into<String>,
        statement: impl Into<String>,
        created_at: u64,
    ) -> Self {
        let mut lineage = self.lineage.clone();
        lineage.push(self.id);

        let mut next = Claim::new(id, title, statement, self.topic_tags.clone(), created_at);
        next.version = self.version + 1;
        next.prev_id = Some(self.id);
        next.lineage = lineage;
        next
    }

    /// Drop everything that is filled on read (reference lists, reports,
    /// tombstone), leaving only the signed fields
    pub fn clear_read_side(&mut self) {
        self.evidence_refs.clear();
        self.counterclaim_refs.clear();
        self.method_refs.clear();
        self.attribution_refs.clear();
        self.confidence_reports.clear();
        self.deleted = None;
    }

    /// Whether this claim has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Whether the lineage is a strict chain: no repeated ids, never
    /// containing this claim, and ending at `prev_id`
    pub fn lineage_is_well_formed(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.lineage.len());
        if self.lineage.iter().any(|id| *id == self.id || !seen.insert(*id)) {
            return false;
        }
        match self.prev_id {
            None => self.lineage.is_empty() && self.version == 1,
            Some(prev) => self.lineage.last() == Some(&prev),
        }
    }

    fn payload(&self) -> ClaimPayload<'_> {
        ClaimPayload {
            id: &self.id,
            title: &self.title,
            statement: &self.statement,
            topic_tags: &self.topic_tags,
            author_key: &self.author_key,
            created_at: self.created_at,
            version: self.version,
            prev_id: &self.prev_id,
            lineage: &self.lineage,
        }
    }
}

impl_signable!(Claim, "claim");
