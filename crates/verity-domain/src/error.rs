//! Shared error taxonomy
//!
//! Each infrastructure crate defines its own error enum. Every one of them
//! classifies into an [`ErrorKind`] so that outer surfaces (HTTP, logs,
//! transparency records) speak one vocabulary regardless of which layer
//! failed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of every failure the engine can surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload signature does not verify against the author key
    InvalidSignature,
    /// Field-level validation failed (ranges, empty text)
    Validation,
    /// Claim revision would break the lineage chain
    LineageCycle,
    /// Claim revision names a parent that does not exist
    UnknownParent,
    /// Requested lens id is not registered
    LensNotFound,
    /// Lens could not execute
    LensUnavailable,
    /// Jury selection cannot satisfy the diversity constraints
    QuorumUnmet,
    /// Signal weight exceeds the influence cap
    WeightCapExceeded,
    /// Unknown or soft-deleted object
    NotFound,
    /// Write collides with existing state (same id, different signature;
    /// second revision of one parent)
    Conflict,
    /// Caller lacks the required privileges
    Unauthorized,
    /// Storage layer failure
    Storage,
}

impl ErrorKind {
    /// Stable snake_case code used in API bodies and records
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::Validation => "validation",
            ErrorKind::LineageCycle => "lineage_cycle",
            ErrorKind::UnknownParent => "unknown_parent",
            ErrorKind::LensNotFound => "lens_not_found",
            ErrorKind::LensUnavailable => "lens_unavailable",
            ErrorKind::QuorumUnmet => "quorum_unmet",
            ErrorKind::WeightCapExceeded => "weight_cap_exceeded",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every crate-level error type
pub trait Fault {
    /// Taxonomy bucket for this error
    fn kind(&self) -> ErrorKind;

    /// Whether retrying the same operation may succeed
    fn is_transient(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_serde() {
        for kind in [
            ErrorKind::InvalidSignature,
            ErrorKind::LineageCycle,
            ErrorKind::WeightCapExceeded,
            ErrorKind::QuorumUnmet,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
