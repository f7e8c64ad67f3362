//! Verity Gatekeeper
//!
//! Admission control for everything written to the provenance graph.
//!
//! The Gatekeeper provides:
//! - Ed25519 signature verification over canonical payloads
//! - Field validation (score ranges, empty and oversized text)
//! - Key handling for clients and tests
//! - Signing of the engine's own transparency records
//!
//! # Examples
//!
//! ```no_run
//! use verity_gatekeeper::{Gatekeeper, KeyPair, ValidationConfig};
//! use verity_domain::{Claim, ClaimId};
//!
//! let keys = KeyPair::generate();
//! let mut claim = Claim::new(ClaimId::new(), "Title", "Statement", vec![], 0);
//! keys.sign_object(&mut claim);
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! assert!(gatekeeper.admit(&claim).is_ok());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod keys;
mod signer;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use keys::{key_fingerprint, parse_verifying_key, payload_digest, Ed25519Verifier, KeyPair, SignatureVerifier};
pub use signer::RecordSigner;
pub use validator::{Gatekeeper, RejectionReason, Validate, ValidationResult, ValidationStatus};
