//! Gatekeeper error types

use crate::validator::RejectionReason;
use thiserror::Error;
use verity_domain::{ErrorKind, Fault};

/// Errors that can occur during gatekeeper operations
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Signature does not verify against the author key
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Author key or signature is not well-formed hex of the right length
    #[error("Malformed key material: {0}")]
    MalformedKey(String),

    /// Field validation failed
    #[error("Validation failed: {}", describe(.0))]
    Validation(Vec<RejectionReason>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe(reasons: &[RejectionReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Fault for GatekeeperError {
    fn kind(&self) -> ErrorKind {
        match self {
            GatekeeperError::InvalidSignature(_) | GatekeeperError::MalformedKey(_) => ErrorKind::InvalidSignature,
            GatekeeperError::Validation(_) | GatekeeperError::Config(_) => ErrorKind::Validation,
        }
    }
}
