//! Evidence items and counterclaims attached to a claim

use crate::ids::{ClaimId, CounterclaimId, EvidenceId, MethodId};
use crate::impl_signable;
use crate::provenance::Tombstone;
use serde::{Deserialize, Serialize};

/// Kind of cited source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// A web page
    Url,
    /// A PDF document
    Pdf,
    /// A transcript of speech
    Transcript,
    /// A dataset
    Dataset,
    /// A primary source
    PrimarySource,
    /// A secondary source
    SecondarySource,
    /// A tertiary source
    TertiarySource,
}

impl EvidenceKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Url => "url",
            EvidenceKind::Pdf => "pdf",
            EvidenceKind::Transcript => "transcript",
            EvidenceKind::Dataset => "dataset",
            EvidenceKind::PrimarySource => "primary_source",
            EvidenceKind::SecondarySource => "secondary_source",
            EvidenceKind::TertiarySource => "tertiary_source",
        }
    }

    /// Parse a kind from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "url" => Some(EvidenceKind::Url),
            "pdf" => Some(EvidenceKind::Pdf),
            "transcript" => Some(EvidenceKind::Transcript),
            "dataset" => Some(EvidenceKind::Dataset),
            "primary_source" => Some(EvidenceKind::PrimarySource),
            "secondary_source" => Some(EvidenceKind::SecondarySource),
            "tertiary_source" => Some(EvidenceKind::TertiarySource),
            _ => None,
        }
    }
}

/// How an evidence item bears on its claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Supports the claim
    Supports,
    /// Contradicts the claim
    Contradicts,
    /// Partly supports, partly contradicts
    Mixed,
    /// Relationship to the claim is unclear
    Unclear,
    /// Bears on the topic without taking a side
    Neutral,
}

impl Stance {
    /// Get the stance name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Supports => "supports",
            Stance::Contradicts => "contradicts",
            Stance::Mixed => "mixed",
            Stance::Unclear => "unclear",
            Stance::Neutral => "neutral",
        }
    }

    /// Parse a stance from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "supports" => Some(Stance::Supports),
            "contradicts" => Some(Stance::Contradicts),
            "mixed" => Some(Stance::Mixed),
            "unclear" => Some(Stance::Unclear),
            "neutral" => Some(Stance::Neutral),
            _ => None,
        }
    }
}

/// A citation bearing on a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique identifier
    pub id: EvidenceId,

    /// The claim this evidence is attached to
    pub claim_id: ClaimId,

    /// Kind of source
    pub kind: EvidenceKind,

    /// Source locator (URL, DOI, archive path)
    pub source: String,

    /// Quoted passage, if any
    #[serde(default)]
    pub quote: Option<String>,

    /// Content hash of the source, if any
    #[serde(default)]
    pub hash: Option<String>,

    /// Original author of the source
    #[serde(default)]
    pub authored_by: Option<String>,

    /// Method used to obtain the evidence
    #[serde(default)]
    pub method_id: Option<MethodId>,

    /// How the evidence bears on the claim
    pub stance: Stance,

    /// Quality score [0.0, 1.0]
    pub quality_score: f64,

    /// Hex-encoded Ed25519 public key of the submitter
    pub author_key: String,

    /// Hex-encoded signature over the canonical payload
    #[serde(default)]
    pub signature: String,

    /// Creation time (Unix millis)
    pub created_at: u64,

    /// Soft-delete marker
    #[serde(default)]
    pub deleted: Option<Tombstone>,
}

#[derive(Serialize)]
struct EvidencePayload<'a> {
    id: &'a EvidenceId,
    claim_id: &'a ClaimId,
    kind: EvidenceKind,
    source: &'a str,
    quote: &'a Option<String>,
    hash: &'a Option<String>,
    authored_by: &'a Option<String>,
    method_id: &'a Option<MethodId>,
    stance: Stance,
    quality_score: f64,
    author_key: &'a str,
    created_at: u64,
}

impl Evidence {
    /// Create an unsigned evidence item
    pub fn new(
        id: EvidenceId,
        claim_id: ClaimId,
        kind: EvidenceKind,
        source: impl Into<String>,
        stance: Stance,
        quality_score: f64,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            claim_id,
            kind,
            source: source.into(),
            quote: None,
            hash: None,
            authored_by: None,
            method_id: None,
            stance,
            quality_score,
            author_key: String::new(),
            signature: String::new(),
            created_at,
            deleted: None,
        }
    }

    /// Attach a quoted passage
    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = Some(quote.into());
        self
    }

    /// Whether this evidence has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    fn payload(&self) -> EvidencePayload<'_> {
        EvidencePayload {
            id: &self.id,
            claim_id: &self.claim_id,
            kind: self.kind,
            source: &self.source,
            quote: &self.quote,
            hash: &self.hash,
            authored_by: &self.authored_by,
            method_id: &self.method_id,
            stance: self.stance,
            quality_score: self.quality_score,
            author_key: &self.author_key,
            created_at: self.created_at,
        }
    }
}

impl_signable!(Evidence, "evidence");

/// Lifecycle status of a counterclaim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterclaimStatus {
    /// Open and contesting the claim
    Active,
    /// Settled
    Resolved,
    /// Retracted by its author
    Withdrawn,
    /// Replaced by a newer counterclaim
    Superseded,
}

impl CounterclaimStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterclaimStatus::Active => "active",
            CounterclaimStatus::Resolved => "resolved",
            CounterclaimStatus::Withdrawn => "withdrawn",
            CounterclaimStatus::Superseded => "superseded",
        }
    }

    /// Parse a status from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CounterclaimStatus::Active),
            "resolved" => Some(CounterclaimStatus::Resolved),
            "withdrawn" => Some(CounterclaimStatus::Withdrawn),
            "superseded" => Some(CounterclaimStatus::Superseded),
            _ => None,
        }
    }
}

/// A competing statement attached to exactly one parent claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterclaim {
    /// Unique identifier
    pub id: CounterclaimId,

    /// The parent claim
    pub claim_id: ClaimId,

    /// The competing statement
    pub statement: String,

    /// Evidence backing the counterclaim
    #[serde(default)]
    pub evidence_refs: Vec<EvidenceId>,

    /// Strength [0.0, 1.0]
    pub strength: f64,

    /// Lifecycle status
    pub status: CounterclaimStatus,

    /// Hex-encoded Ed25519 public key of the submitter
    pub author_key: String,

    /// Hex-encoded signature over the canonical payload
    #[serde(default)]
    pub signature: String,

    /// Creation time (Unix millis)
    pub created_at: u64,

    /// Soft-delete marker
    #[serde(default)]
    pub deleted: Option<Tombstone>,
}

#[derive(Serialize)]
struct CounterclaimPayload<'a> {
    id: &'a CounterclaimId,
    claim_id: &'a ClaimId,
    statement: &'a str,
    evidence_refs: &'a [EvidenceId],
    strength: f64,
    status: CounterclaimStatus,
    author_key: &'a str,
    created_at: u64,
}

impl Counterclaim {
    /// Create an unsigned, active counterclaim
    pub fn new(
        id: CounterclaimId,
        claim_id: ClaimId,
        statement: impl Into<String>,
        strength: f64,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            claim_id,
            statement: statement.into(),
            evidence_refs: Vec::new(),
            strength,
            status: CounterclaimStatus::Active,
            author_key: String::new(),
            signature: String::new(),
            created_at,
            deleted: None,
        }
    }

    /// Whether this counterclaim still contests its claim
    pub fn is_active(&self) -> bool {
        self.status == CounterclaimStatus::Active && self.deleted.is_none()
    }

    fn payload(&self) -> CounterclaimPayload<'_> {
        CounterclaimPayload {
            id: &self.id,
            claim_id: &self.claim_id,
            statement: &self.statement,
            evidence_refs: &self.evidence_refs,
            strength: self.strength,
            status: self.status,
            author_key: &self.author_key,
            created_at: self.created_at,
        }
    }
}

impl_signable!(Counterclaim, "counterclaim");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::Signable;

    #[test]
    fn test_enum_strings_roundtrip() {
        for kind in [EvidenceKind::Url, EvidenceKind::PrimarySource, EvidenceKind::Dataset] {
            assert_eq!(EvidenceKind::parse(kind.as_str()), Some(kind));
        }
        for stance in [Stance::Supports, Stance::Contradicts, Stance::Neutral] {
            assert_eq!(Stance::parse(stance.as_str()), Some(stance));
        }
        assert_eq!(CounterclaimStatus::parse("withdrawn"), Some(CounterclaimStatus::Withdrawn));
        assert_eq!(CounterclaimStatus::parse("open"), None);
    }

    #[test]
    fn test_evidence_payload_covers_stance() {
        let ev = Evidence::new(
            EvidenceId::from_value(1),
            ClaimId::from_value(2),
            EvidenceKind::Url,
            "https://example.org",
            Stance::Supports,
            0.8,
            10,
        );
        let mut flipped = ev.clone();
        flipped.stance = Stance::Contradicts;
        assert_ne!(ev.signing_payload(), flipped.signing_payload());
    }

    #[test]
    fn test_counterclaim_active() {
        let mut cc = Counterclaim::new(
            CounterclaimId::from_value(1),
            ClaimId::from_value(2),
            "It boils lower at altitude",
            0.6,
            10,
        );
        assert!(cc.is_active());

        cc.status = CounterclaimStatus::Resolved;
        assert!(!cc.is_active());

        cc.status = CounterclaimStatus::Active;
        cc.deleted = Some(Tombstone::new("mod", 11));
        assert!(!cc.is_active());
    }
}
