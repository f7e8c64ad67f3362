//! Write validation logic

use crate::keys::{Ed25519Verifier, SignatureVerifier};
use crate::{GatekeeperError, ValidationConfig};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use verity_domain::{Attribution, Claim, Counterclaim, Evidence, Method, PlayfulSignal, Signable};

/// Result of field validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the object passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Object accepted
    Accepted,

    /// Object rejected
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Signature did not verify
    InvalidSignature {
        /// What went wrong
        detail: String,
    },

    /// A required text field is empty
    EmptyField {
        /// Field name
        field: &'static str,
    },

    /// A score is outside [0, 1] or not finite
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A text field exceeds its configured length
    TooLong {
        /// Field name
        field: &'static str,
        /// Actual length in characters
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// A collection has too many entries
    TooMany {
        /// Field name
        field: &'static str,
        /// Actual count
        count: usize,
        /// Configured maximum
        max: usize,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InvalidSignature { detail } => write!(f, "invalid signature ({})", detail),
            RejectionReason::EmptyField { field } => write!(f, "{} must not be empty", field),
            RejectionReason::OutOfRange { field, value } => write!(f, "{} {} is outside [0.0, 1.0]", field, value),
            RejectionReason::TooLong { field, len, max } => {
                write!(f, "{} is {} characters, max {}", field, len, max)
            }
            RejectionReason::TooMany { field, count, max } => write!(f, "{} has {} entries, max {}", field, count, max),
        }
    }
}

/// Field-level checks for a writable object
pub trait Validate {
    /// Collect every rule the object breaks under `config`
    fn check(&self, config: &ValidationConfig) -> Vec<RejectionReason>;
}

fn check_text(
    reasons: &mut Vec<RejectionReason>,
    field: &'static str,
    value: &str,
    required: bool,
    max: usize,
) {
    if required && value.trim().is_empty() {
        reasons.push(RejectionReason::EmptyField { field });
        return;
    }
    let len = value.chars().count();
    if len > max {
        reasons.push(RejectionReason::TooLong { field, len, max });
    }
}

fn check_unit(reasons: &mut Vec<RejectionReason>, field: &'static str, value: f64) {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        reasons.push(RejectionReason::OutOfRange { field, value });
    }
}

impl Validate for Claim {
    fn check(&self, config: &ValidationConfig) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        check_text(&mut reasons, "title", &self.title, config.require_title, config.max_title_len);
        check_text(&mut reasons, "statement", &self.statement, true, config.max_statement_len);

        if self.topic_tags.len() > config.max_topic_tags {
            reasons.push(RejectionReason::TooMany {
                field: "topic_tags",
                count: self.topic_tags.len(),
                max: config.max_topic_tags,
            });
        }
        if self.topic_tags.iter().any(|t| t.trim().is_empty()) {
            reasons.push(RejectionReason::EmptyField { field: "topic_tag" });
        }
        reasons
    }
}

impl Validate for Evidence {
    fn check(&self, config: &ValidationConfig) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        check_text(&mut reasons, "source", &self.source, true, config.max_source_len);
        if let Some(quote) = &self.quote {
            check_text(&mut reasons, "quote", quote, false, config.max_quote_len);
        }
        check_unit(&mut reasons, "quality_score", self.quality_score);
        reasons
    }
}

impl Validate for Counterclaim {
    fn check(&self, config: &ValidationConfig) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        check_text(&mut reasons, "statement", &self.statement, true, config.max_statement_len);
        check_unit(&mut reasons, "strength", self.strength);
        reasons
    }
}

impl Validate for Method {
    fn check(&self, config: &ValidationConfig) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        check_text(&mut reasons, "description", &self.description, true, config.max_description_len);
        reasons
    }
}

impl Validate for Attribution {
    fn check(&self, config: &ValidationConfig) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        check_text(&mut reasons, "actor_id", &self.actor_id, true, config.max_title_len);
        check_text(&mut reasons, "contribution", &self.contribution, false, config.max_description_len);
        if let Some(weight) = self.weight {
            check_unit(&mut reasons, "weight", weight);
        }
        reasons
    }
}

// Weight cap and verification confidence are the ingestor's checks, since
// they carry their own error kinds.
impl Validate for PlayfulSignal {
    fn check(&self, config: &ValidationConfig) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        check_text(&mut reasons, "argument_id", &self.argument_id, true, config.max_title_len);
        check_text(&mut reasons, "verification.method", &self.verification.method, true, config.max_title_len);
        check_text(&mut reasons, "verification.dispute_id", &self.verification.dispute_id, true, config.max_title_len);
        reasons
    }
}

/// The Gatekeeper checks signatures and fields before anything is stored
#[derive(Clone)]
pub struct Gatekeeper {
    config: ValidationConfig,
    verifier: Arc<dyn SignatureVerifier>,
}

impl fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gatekeeper").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration and Ed25519 verification
    pub fn new(config: ValidationConfig) -> Self {
        Self::with_verifier(config, Arc::new(Ed25519Verifier))
    }

    /// Create a Gatekeeper with a custom signature verifier
    pub fn with_verifier(config: ValidationConfig, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { config, verifier }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Active validation rules
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Verify an object's signature against its author key
    pub fn verify_signature(&self, object: &dyn Signable) -> Result<(), GatekeeperError> {
        self.verifier.verify_object(object)
    }

    /// Run field validation only
    pub fn validate<T: Validate + ?Sized>(&self, object: &T) -> ValidationResult {
        let reasons = object.check(&self.config);
        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };
        ValidationResult { status, reasons }
    }

    /// Full admission check: signature first, then fields
    ///
    /// # Errors
    ///
    /// `InvalidSignature`/`MalformedKey` when the signature does not verify,
    /// `Validation` with every broken rule otherwise.
    pub fn admit<T: Validate + Signable>(&self, object: &T) -> Result<ValidationResult, GatekeeperError> {
        self.verify_signature(object)?;

        let result = self.validate(object);
        if result.status == ValidationStatus::Rejected {
            return Err(GatekeeperError::Validation(result.reasons));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    use verity_domain::{ClaimId, EvidenceId, EvidenceKind, Stance};

    fn keys() -> KeyPair {
        KeyPair::from_secret_bytes([42u8; 32])
    }

    fn create_test_claim() -> Claim {
        let mut claim = Claim::new(
            ClaimId::new(),
            "Coffee contains caffeine",
            "Brewed coffee contains roughly 95mg of caffeine per cup.",
            vec!["nutrition".to_string()],
            1_700_000_000_000,
        );
        keys().sign_object(&mut claim);
        claim
    }

    #[test]
    fn test_valid_claim() {
        let gatekeeper = Gatekeeper::default_config();
        let claim = create_test_claim();
        let result = gatekeeper.admit(&claim).unwrap();

        assert_eq!(result.status, ValidationStatus::Accepted);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_signature_checked_before_fields() {
        let gatekeeper = Gatekeeper::default_config();
        let mut claim = create_test_claim();
        claim.statement = String::new();

        let err = gatekeeper.admit(&claim).unwrap_err();
        assert!(matches!(err, GatekeeperError::InvalidSignature(_)));
    }

    #[test]
    fn test_empty_statement() {
        let gatekeeper = Gatekeeper::default_config();
        let mut claim = create_test_claim();
        claim.statement = "   ".to_string();
        keys().sign_object(&mut claim);

        match gatekeeper.admit(&claim).unwrap_err() {
            GatekeeperError::Validation(reasons) => {
                assert_eq!(reasons, vec![RejectionReason::EmptyField { field: "statement" }]);
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_quality_out_of_range() {
        let gatekeeper = Gatekeeper::default_config();
        let mut evidence = Evidence::new(
            EvidenceId::new(),
            ClaimId::new(),
            EvidenceKind::Url,
            "https://example.org/study",
            Stance::Supports,
            1.5,
            1,
        );
        keys().sign_object(&mut evidence);

        let result = gatekeeper.validate(&evidence);
        assert_eq!(result.status, ValidationStatus::Rejected);
        assert!(matches!(
            result.reasons[0],
            RejectionReason::OutOfRange { field: "quality_score", .. }
        ));

        evidence.quality_score = f64::NAN;
        assert_eq!(gatekeeper.validate(&evidence).status, ValidationStatus::Rejected);
    }

    #[test]
    fn test_strict_and_permissive_limits() {
        let mut claim = create_test_claim();
        claim.title = "t".repeat(200);

        let strict = Gatekeeper::new(ValidationConfig::strict());
        let result = strict.validate(&claim);
        assert!(matches!(result.reasons[0], RejectionReason::TooLong { field: "title", .. }));

        claim.title = String::new();
        let permissive = Gatekeeper::new(ValidationConfig::permissive());
        assert_eq!(permissive.validate(&claim).status, ValidationStatus::Accepted);
    }

    #[test]
    fn test_multiple_validation_errors() {
        let gatekeeper = Gatekeeper::default_config();
        let mut counterclaim = Counterclaim::new(verity_domain::CounterclaimId::new(), ClaimId::new(), "", 2.0, 1);
        keys().sign_object(&mut counterclaim);

        let result = gatekeeper.validate(&counterclaim);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.status, ValidationStatus::Rejected);
    }

    #[test]
    fn test_reason_display() {
        let reason = RejectionReason::TooLong {
            field: "title",
            len: 400,
            max: 300,
        };
        assert_eq!(reason.to_string(), "title is 400 characters, max 300");
    }
}
