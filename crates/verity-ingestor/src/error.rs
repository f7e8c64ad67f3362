//! Ingestor error types

use thiserror::Error;
use verity_domain::{ErrorKind, Fault};
use verity_gatekeeper::GatekeeperError;

/// Why a signal was refused, or why ingestion could not complete
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Signature does not verify against the author key
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Weight exceeds the influence cap (or is negative / not finite)
    #[error("Weight {weight} exceeds the influence cap {cap}")]
    WeightCapExceeded {
        /// Submitted weight
        weight: f64,
        /// Maximum allowed weight
        cap: f64,
    },

    /// A field failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Claim or argument is unknown or soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// Same signal id already stored with a different signature
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store failed
    #[error("Store error ({kind}): {message}")]
    Store {
        /// Classification reported by the store
        kind: ErrorKind,
        /// Store error message
        message: String,
    },

    /// The worker is no longer accepting jobs
    #[error("Ingest worker stopped")]
    WorkerStopped,
}

impl IngestError {
    /// Wrap a store error, keeping its classification
    pub fn store<E: Fault + std::fmt::Display>(err: &E) -> Self {
        match err.kind() {
            ErrorKind::NotFound => IngestError::NotFound(err.to_string()),
            ErrorKind::Conflict => IngestError::Conflict(err.to_string()),
            kind => IngestError::Store {
                kind,
                message: err.to_string(),
            },
        }
    }

    /// Whether this is a refusal of the signal rather than an
    /// infrastructure failure
    pub fn is_rejection(&self) -> bool {
        !matches!(self, IngestError::Store { .. } | IngestError::WorkerStopped)
    }
}

impl From<GatekeeperError> for IngestError {
    fn from(err: GatekeeperError) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => IngestError::InvalidSignature(err.to_string()),
            _ => IngestError::Validation(err.to_string()),
        }
    }
}

impl Fault for IngestError {
    fn kind(&self) -> ErrorKind {
        match self {
            IngestError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            IngestError::WeightCapExceeded { .. } => ErrorKind::WeightCapExceeded,
            IngestError::Validation(_) => ErrorKind::Validation,
            IngestError::NotFound(_) => ErrorKind::NotFound,
            IngestError::Conflict(_) => ErrorKind::Conflict,
            IngestError::Store { kind, .. } => *kind,
            IngestError::WorkerStopped => ErrorKind::Storage,
        }
    }
}
