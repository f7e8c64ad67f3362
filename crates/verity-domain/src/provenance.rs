//! Soft-delete tombstones and object kinds of the provenance graph

use serde::{Deserialize, Serialize};

/// Marks an object as soft-deleted without removing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// Actor that requested the deletion
    pub deleted_by: String,

    /// When the deletion happened (Unix millis)
    pub deleted_at: u64,
}

impl Tombstone {
    /// Create a new tombstone
    pub fn new(deleted_by: impl Into<String>, deleted_at: u64) -> Self {
        Self {
            deleted_by: deleted_by.into(),
            deleted_at,
        }
    }
}

/// Kinds of graph objects that can be soft-deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A claim version
    Claim,
    /// An evidence item
    Evidence,
    /// A counterclaim
    Counterclaim,
    /// A method description
    Method,
    /// An attribution
    Attribution,
}

impl ObjectKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Claim => "claim",
            ObjectKind::Evidence => "evidence",
            ObjectKind::Counterclaim => "counterclaim",
            ObjectKind::Method => "method",
            ObjectKind::Attribution => "attribution",
        }
    }

    /// Parse a kind from a string, accepting plural forms
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "claim" | "claims" => Some(ObjectKind::Claim),
            "evidence" => Some(ObjectKind::Evidence),
            "counterclaim" | "counterclaims" => Some(ObjectKind::Counterclaim),
            "method" | "methods" => Some(ObjectKind::Method),
            "attribution" | "attributions" => Some(ObjectKind::Attribution),
            _ => None,
        }
    }
}

/// Options for reads against the provenance graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Include soft-deleted rows (audit tooling only)
    pub include_deleted: bool,
}

impl ReadOptions {
    /// Default reads: live rows only
    pub fn live() -> Self {
        Self { include_deleted: false }
    }

    /// Audit reads: include soft-deleted rows
    pub fn audit() -> Self {
        Self { include_deleted: true }
    }
}
