//! The lens contract
//!
//! A lens is a pure evaluation over a snapshot of one claim. It never
//! touches the store; the orchestrator loads the snapshot, runs the lens on
//! a blocking task, and persists whatever comes back.

use crate::error::LensError;
use crate::jury::{JuryConstraints, Juror, Panel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use verity_domain::{Claim, Counterclaim, Evidence, PlayfulSignal};

/// Advisory metadata for a registered lens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensDescriptor {
    /// Stable id (e.g. `L1_evidence_first`)
    pub id: String,
    /// Display name
    pub name: String,
    /// What the lens measures
    pub description: String,
    /// Advisory weight; never used to aggregate reports
    pub weight: f64,
}

impl LensDescriptor {
    /// Build a descriptor
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            weight,
        }
    }
}

/// A pluggable evaluation strategy
pub trait Lens: Send + Sync {
    /// Metadata, including the id reports are filed under
    fn descriptor(&self) -> &LensDescriptor;

    /// Score the claim in `ctx`
    ///
    /// Must be deterministic for a given context and must not perform I/O.
    fn evaluate(&self, ctx: &LensContext) -> Result<LensResult, LensError>;
}

/// Everything a lens may look at
#[derive(Debug, Clone)]
pub struct LensContext {
    /// The claim under evaluation
    pub claim: Claim,
    /// Live evidence attached to the claim
    pub evidence: Vec<Evidence>,
    /// Live counterclaims attached to the claim
    pub counterclaims: Vec<Counterclaim>,
    /// Accepted playful signals for the claim
    pub signals: Vec<PlayfulSignal>,
    /// Caller-supplied run parameters
    pub params: LensParams,
}

impl LensContext {
    /// Context with no attachments and default parameters
    pub fn for_claim(claim: Claim) -> Self {
        Self {
            claim,
            evidence: Vec::new(),
            counterclaims: Vec::new(),
            signals: Vec::new(),
            params: LensParams::default(),
        }
    }
}

/// Optional per-run parameters, passed as the JSON body of a run request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensParams {
    /// Candidate pool, constraints and votes for the expert jury
    #[serde(default)]
    pub jury: Option<JuryParams>,

    /// Notes and pairwise comparisons for community notes
    #[serde(default)]
    pub notes: Option<NotesParams>,
}

/// Expert jury inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JuryParams {
    /// Eligible jurors
    #[serde(default)]
    pub candidates: Vec<Juror>,

    /// Diversity constraints for panel selection
    #[serde(default)]
    pub constraints: JuryConstraints,

    /// Vote per actor id, in [0, 1] (1 = claim holds)
    #[serde(default)]
    pub votes: BTreeMap<String, f64>,
}

/// Community note stance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStance {
    /// Note backs the claim
    Supports,
    /// Note disputes the claim
    Contradicts,
    /// Note adds context without taking a side
    Neutral,
}

impl NoteStance {
    /// Numeric stance value
    pub fn value(&self) -> f64 {
        match self {
            NoteStance::Supports => 1.0,
            NoteStance::Contradicts => 0.0,
            NoteStance::Neutral => 0.5,
        }
    }
}

/// A community-written note on the claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityNote {
    /// Note id, referenced by comparisons
    pub id: String,
    /// Which way the note leans
    pub stance: NoteStance,
    /// Note text
    #[serde(default)]
    pub text: String,
}

/// One pairwise helpfulness judgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Note judged more helpful
    pub winner: String,
    /// Note judged less helpful
    pub loser: String,
}

/// Community notes inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesParams {
    /// Notes under consideration
    #[serde(default)]
    pub notes: Vec<CommunityNote>,

    /// Comparisons in submission order
    #[serde(default)]
    pub comparisons: Vec<Comparison>,
}

/// Raw lens output, before the orchestrator turns it into a report
#[derive(Debug, Clone, PartialEq)]
pub struct LensResult {
    /// Support for the claim in [0, 1]
    pub score: f64,
    /// Certainty of the score in [0, 1]
    pub confidence: f64,
    /// Snapshot of what went into the score
    pub inputs: BTreeMap<String, Value>,
    /// Human-readable minority views
    pub dissenting_views: Vec<String>,
    /// Selected jury, when the lens convened one
    pub panel: Option<Panel>,
}

impl LensResult {
    /// Result with no inputs or dissent
    pub fn new(score: f64, confidence: f64) -> Self {
        Self {
            score,
            confidence,
            inputs: BTreeMap::new(),
            dissenting_views: Vec::new(),
            panel: None,
        }
    }

    /// Neutral score with zero confidence and an explanatory note
    pub fn low_confidence(note: impl Into<String>) -> Self {
        let mut result = Self::new(0.5, 0.0);
        result.dissenting_views.push(note.into());
        result
    }

    /// Add an input entry
    pub fn with_input(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.to_string(), value.into());
        self
    }
}
