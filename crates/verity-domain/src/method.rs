//! Methods and attributions

use crate::ids::{AttributionId, ClaimId, MethodId};
use crate::impl_signable;
use crate::provenance::Tombstone;
use serde::{Deserialize, Serialize};

/// Review status of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Not yet reviewed
    Draft,
    /// Reviewed by peers
    PeerReviewed,
    /// Validated by the community
    CommunityValidated,
    /// No longer recommended
    Deprecated,
}

impl ValidationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Draft => "draft",
            ValidationStatus::PeerReviewed => "peer_reviewed",
            ValidationStatus::CommunityValidated => "community_validated",
            ValidationStatus::Deprecated => "deprecated",
        }
    }

    /// Parse a status from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ValidationStatus::Draft),
            "peer_reviewed" => Some(ValidationStatus::PeerReviewed),
            "community_validated" => Some(ValidationStatus::CommunityValidated),
            "deprecated" => Some(ValidationStatus::Deprecated),
            _ => None,
        }
    }
}

/// A description of how evidence was gathered or a claim was checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    /// Unique identifier
    pub id: MethodId,

    /// The claim this method is attached to
    pub claim_id: ClaimId,

    /// What the method does
    pub description: String,

    /// References to published protocols
    #[serde(default)]
    pub protocol_refs: Vec<String>,

    /// Method version
    pub version: u32,

    /// Review status
    pub validation_status: ValidationStatus,

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
struct MethodPayload<'a> {
    id: &'a MethodId,
    claim_id: &'a ClaimId,
    description: &'a str,
    protocol_refs: &'a [String],
    version: u32,
    validation_status: ValidationStatus,
    author_key: &'a str,
    created_at: u64,
}

impl Method {
    /// Create an unsigned draft method
    pub fn new(id: MethodId, claim_id: ClaimId, description: impl Into<String>, created_at: u64) -> Self {
        Self {
            id,
            claim_id,
            description: description.into(),
            protocol_refs: Vec::new(),
            version: 1,
            validation_status: ValidationStatus::Draft,
            author_key: String::new(),
            signature: String::new(),
            created_at,
            deleted: None,
        }
    }

    fn payload(&self) -> MethodPayload<'_> {
        MethodPayload {
            id: &self.id,
            claim_id: &self.claim_id,
            description: &self.description,
            protocol_refs: &self.protocol_refs,
            version: self.version,
            validation_status: self.validation_status,
            author_key: &self.author_key,
            created_at: self.created_at,
        }
    }
}

impl_signable!(Method, "method");

/// Role an actor played for a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionRole {
    /// Asserted the claim
    Assertor,
    /// Reviewed the claim
    Reviewer,
    /// Sat on a jury for the claim
    Juror,
    /// Validated evidence
    Validator,
    /// Authored a method
    Methodologist,
}

impl AttributionRole {
    /// Get the role name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionRole::Assertor => "assertor",
            AttributionRole::Reviewer => "reviewer",
            AttributionRole::Juror => "juror",
            AttributionRole::Validator => "validator",
            AttributionRole::Methodologist => "methodologist",
        }
    }

    /// Parse a role from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "assertor" => Some(AttributionRole::Assertor),
            "reviewer" => Some(AttributionRole::Reviewer),
            "juror" => Some(AttributionRole::Juror),
            "validator" => Some(AttributionRole::Validator),
            "methodologist" => Some(AttributionRole::Methodologist),
            _ => None,
        }
    }
}

/// Credit for a contribution to a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Unique identifier
    pub id: AttributionId,

    /// The claim this attribution is attached to
    pub claim_id: ClaimId,

    /// Who is credited
    pub actor_id: String,

    /// In what role
    pub role: AttributionRole,

    /// Optional proof of the contribution
    #[serde(default)]
    pub proof: Option<String>,

    /// Description of the contribution
    pub contribution: String,

    /// Relative weight [0.0, 1.0]
    #[serde(default)]
    pub weight: Option<f64>,

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
struct AttributionPayload<'a> {
    id: &'a AttributionId,
    claim_id: &'a ClaimId,
    actor_id: &'a str,
    role: AttributionRole,
    proof: &'a Option<String>,
    contribution: &'a str,
    weight: Option<f64>,
    author_key: &'a str,
    created_at: u64,
}

impl Attribution {
    /// Create an unsigned attribution
    pub fn new(
        id: AttributionId,
        claim_id: ClaimId,
        actor_id: impl Into<String>,
        role: AttributionRole,
        contribution: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            claim_id,
            actor_id: actor_id.into(),
            role,
            proof: None,
            contribution: contribution.into(),
            weight: None,
            author_key: String::new(),
            signature: String::new(),
            created_at,
            deleted: None,
        }
    }

    fn payload(&self) -> AttributionPayload<'_> {
        AttributionPayload {
            id: &self.id,
            claim_id: &self.claim_id,
            actor_id: &self.actor_id,
            role: self.role,
            proof: &self.proof,
            contribution: &self.contribution,
            weight: self.weight,
            author_key: &self.author_key,
            created_at: self.created_at,
        }
    }
}

impl_signable!(Attribution, "attribution");
