//! Transparency records - the append-only audit trail
//!
//! Every consequential decision (a lens run, a jury composition, a signal
//! acceptance or rejection, a rejected write, a deletion) leaves one signed
//! record. Records are never updated after creation.

use crate::ids::RecordId;
use crate::impl_signable;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of decision a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// A lens produced a report
    LensRun,
    /// A jury panel was composed for a lens run
    JuryComposition,
    /// A playful signal was accepted
    SignalAccepted,
    /// A playful signal was rejected
    SignalRejected,
    /// A graph write was rejected
    WriteRejected,
    /// A graph object was soft-deleted
    ObjectDeleted,
}

impl RecordType {
    /// Get the record type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::LensRun => "lens_run",
            RecordType::JuryComposition => "jury_composition",
            RecordType::SignalAccepted => "signal_accepted",
            RecordType::SignalRejected => "signal_rejected",
            RecordType::WriteRejected => "write_rejected",
            RecordType::ObjectDeleted => "object_deleted",
        }
    }

    /// Parse a record type from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lens_run" => Some(RecordType::LensRun),
            "jury_composition" => Some(RecordType::JuryComposition),
            "signal_accepted" => Some(RecordType::SignalAccepted),
            "signal_rejected" => Some(RecordType::SignalRejected),
            "write_rejected" => Some(RecordType::WriteRejected),
            "object_deleted" => Some(RecordType::ObjectDeleted),
            _ => None,
        }
    }
}

/// A signed, immutable audit entry explaining a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyRecord {
    /// Unique identifier
    pub id: RecordId,

    /// Kind of decision
    pub record_type: RecordType,

    /// Ids of the objects the decision concerns
    pub subject_ids: Vec<String>,

    /// The decision itself (e.g. "accepted", "rejected: weight_cap_exceeded")
    pub decision: String,

    /// Snapshot of the features/inputs the decision was made on
    pub snapshot: Value,

    /// Human-readable explanation lines
    pub explanation: Vec<String>,

    /// Hex-encoded public key of the signing actor
    pub author_key: String,

    /// Hex-encoded signature over the canonical payload
    #[serde(default)]
    pub signature: String,

    /// When the record was created (Unix millis)
    pub created_at: u64,
}

#[derive(Serialize)]
struct RecordPayload<'a> {
    id: &'a RecordId,
    record_type: RecordType,
    subject_ids: &'a [String],
    decision: &'a str,
    snapshot: &'a Value,
    explanation: &'a [String],
    author_key: &'a str,
    created_at: u64,
}

impl TransparencyRecord {
    /// Create an unsigned record
    pub fn new(
        record_type: RecordType,
        subject_ids: Vec<String>,
        decision: impl Into<String>,
        snapshot: Value,
        explanation: Vec<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id: RecordId::new(),
            record_type,
            subject_ids,
            decision: decision.into(),
            snapshot,
            explanation,
            author_key: String::new(),
            signature: String::new(),
            created_at,
        }
    }

    /// Whether the record concerns the given subject id
    pub fn concerns(&self, subject: &str) -> bool {
        self.subject_ids.iter().any(|s| s == subject)
    }

    fn payload(&self) -> RecordPayload<'_> {
        RecordPayload {
            id: &self.id,
            record_type: self.record_type,
            subject_ids: &self.subject_ids,
            decision: &self.decision,
            snapshot: &self.snapshot,
            explanation: &self.explanation,
            author_key: &self.author_key,
            created_at: self.created_at,
        }
    }
}

impl_signable!(TransparencyRecord, "transparency_record");
