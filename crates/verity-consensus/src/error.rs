//! Consensus error types

use thiserror::Error;
use verity_domain::{ErrorKind, Fault};

/// Errors raised by jury selection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JuryError {
    /// A required cluster has fewer eligible candidates than the minimum
    #[error("Quorum unmet: cluster '{cluster}' has {available} eligible candidates, {required} required")]
    ClusterShortfall {
        /// Cluster that could not be filled
        cluster: String,
        /// Eligible candidates in that cluster
        available: usize,
        /// Minimum per cluster
        required: usize,
    },

    /// The panel covers too small a share of the pool's clusters
    #[error("Quorum unmet: panel covers {coverage:.2} of clusters, {required:.2} required")]
    CoverageBelowQuorum {
        /// Fraction of pool clusters represented on the panel
        coverage: f64,
        /// Configured quorum percentage
        required: f64,
    },

    /// Constraints contradict each other or are out of range
    #[error("Invalid jury constraints: {0}")]
    InvalidConstraints(String),
}

impl Fault for JuryError {
    fn kind(&self) -> ErrorKind {
        match self {
            JuryError::ClusterShortfall { .. } | JuryError::CoverageBelowQuorum { .. } => ErrorKind::QuorumUnmet,
            JuryError::InvalidConstraints(_) => ErrorKind::Validation,
        }
    }
}

/// Errors a lens may return from evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LensError {
    /// Run parameters are malformed
    #[error("Invalid lens parameters: {0}")]
    InvalidParams(String),

    /// Jury selection failed
    #[error(transparent)]
    Jury(#[from] JuryError),

    /// The lens cannot produce a result right now
    #[error("Lens unavailable: {0}")]
    Unavailable(String),
}

impl Fault for LensError {
    fn kind(&self) -> ErrorKind {
        match self {
            LensError::InvalidParams(_) => ErrorKind::Validation,
            LensError::Jury(e) => e.kind(),
            LensError::Unavailable(_) => ErrorKind::LensUnavailable,
        }
    }
}

/// Errors surfaced by the orchestrator
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// No lens registered under this id
    #[error("Lens not found: {0}")]
    LensNotFound(String),

    /// A lens with this id is already registered
    #[error("Lens already registered: {0}")]
    DuplicateLens(String),

    /// Claim missing or soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an out-of-range argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Lens evaluation failed
    #[error(transparent)]
    Lens(#[from] LensError),

    /// The store refused or failed the operation
    #[error("Store error ({kind}): {message}")]
    Store {
        /// Classification reported by the store
        kind: ErrorKind,
        /// Store error message
        message: String,
    },
}

impl ConsensusError {
    /// Wrap a store error, keeping its classification
    pub fn store<E: Fault + std::fmt::Display>(err: &E) -> Self {
        ConsensusError::Store {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl Fault for ConsensusError {
    fn kind(&self) -> ErrorKind {
        match self {
            ConsensusError::LensNotFound(_) => ErrorKind::LensNotFound,
            ConsensusError::DuplicateLens(_) => ErrorKind::Conflict,
            ConsensusError::NotFound(_) => ErrorKind::NotFound,
            ConsensusError::InvalidArgument(_) => ErrorKind::Validation,
            ConsensusError::Lens(e) => e.kind(),
            ConsensusError::Store { kind, .. } => *kind,
        }
    }
}
