//! Engine-side signing of transparency records

use crate::keys::{key_fingerprint, KeyPair};
use serde_json::Value;
use verity_domain::{now_millis, RecordType, TransparencyRecord};

/// Holds the engine key and produces signed transparency records
#[derive(Debug, Clone)]
pub struct RecordSigner {
    keys: KeyPair,
}

impl RecordSigner {
    /// Create a signer for the given key
    pub fn new(keys: KeyPair) -> Self {
        Self { keys }
    }

    /// Create a signer with a freshly generated key
    ///
    /// Records signed by an ephemeral key cannot be attributed to this engine
    /// after a restart.
    pub fn ephemeral() -> Self {
        let keys = KeyPair::generate();
        tracing::warn!(
            fingerprint = %key_fingerprint(&keys.public_hex()),
            "Using an ephemeral engine signing key"
        );
        Self { keys }
    }

    /// Hex public key records are signed with
    pub fn public_hex(&self) -> String {
        self.keys.public_hex()
    }

    /// Build and sign a record stamped with the current time
    pub fn record(
        &self,
        record_type: RecordType,
        subject_ids: Vec<String>,
        decision: impl Into<String>,
        snapshot: Value,
        explanation: Vec<String>,
    ) -> TransparencyRecord {
        let record = TransparencyRecord::new(
            record_type,
            subject_ids,
            decision,
            snapshot,
            explanation,
            now_millis(),
        );
        self.sign(record)
    }

    /// Sign an already built record
    pub fn sign(&self, mut record: TransparencyRecord) -> TransparencyRecord {
        self.keys.sign_object(&mut record);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{Ed25519Verifier, SignatureVerifier};
    use serde_json::json;

    #[test]
    fn test_records_verify() {
        let signer = RecordSigner::new(KeyPair::from_secret_bytes([3u8; 32]));
        let record = signer.record(
            RecordType::SignalRejected,
            vec!["signal-1".to_string()],
            "rejected",
            json!({"reason": "weight_cap_exceeded"}),
            vec!["weight 0.05 exceeds cap 0.02".to_string()],
        );

        assert_eq!(record.author_key, signer.public_hex());
        assert!(record.created_at > 0);
        assert!(Ed25519Verifier.verify_object(&record).is_ok());
    }
}
