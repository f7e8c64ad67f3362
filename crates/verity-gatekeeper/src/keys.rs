//! Ed25519 key handling and signature verification
//!
//! Keys and signatures travel as lowercase hex: 64 characters for a public
//! key, 128 for a signature.

use crate::GatekeeperError;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand_core::OsRng;
use verity_domain::Signable;

/// Checks detached signatures over canonical payloads
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature_hex` over `message` for the key in `author_key_hex`
    fn verify(&self, author_key_hex: &str, message: &[u8], signature_hex: &str) -> Result<(), GatekeeperError>;

    /// Verify a signable object against its own author key
    fn verify_object(&self, object: &dyn Signable) -> Result<(), GatekeeperError> {
        self.verify(object.author_key(), &object.signing_payload(), object.signature())
    }
}

/// Ed25519 signature verifier
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, author_key_hex: &str, message: &[u8], signature_hex: &str) -> Result<(), GatekeeperError> {
        let key = parse_verifying_key(author_key_hex)?;
        let sig_bytes = hex::decode(signature_hex)
            .map_err(|e| GatekeeperError::MalformedKey(format!("signature is not hex: {}", e)))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| GatekeeperError::MalformedKey(format!("signature must be 64 bytes, got {}", sig_bytes.len())))?;

        key.verify(message, &signature)
            .map_err(|_| GatekeeperError::InvalidSignature("signature does not match payload".to_string()))
    }
}

/// Parse a hex-encoded Ed25519 public key
pub fn parse_verifying_key(hex_key: &str) -> Result<VerifyingKey, GatekeeperError> {
    let bytes = decode_32(hex_key, "public key")?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| GatekeeperError::MalformedKey("public key is not a valid curve point".to_string()))
}

fn decode_32(hex_str: &str, what: &str) -> Result<[u8; 32], GatekeeperError> {
    let bytes =
        hex::decode(hex_str).map_err(|e| GatekeeperError::MalformedKey(format!("{} is not hex: {}", what, e)))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| GatekeeperError::MalformedKey(format!("{} must be 32 bytes, got {}", what, len)))
}

/// BLAKE3 digest of a payload, hex-encoded
pub fn payload_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Short, log-friendly fingerprint of a hex public key
pub fn key_fingerprint(public_hex: &str) -> String {
    let digest = payload_digest(public_hex.as_bytes());
    digest[..16].to_string()
}

/// An Ed25519 signing key with hex helpers
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_hex())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a fresh random key pair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build from a 32-byte secret
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// Build from a hex-encoded 32-byte secret
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, GatekeeperError> {
        Ok(Self::from_secret_bytes(decode_32(secret_hex, "secret key")?))
    }

    /// Hex-encoded secret (for writing configuration)
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Hex-encoded public key
    pub fn public_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message, returning a hex signature
    pub fn sign(&self, message: &[u8]) -> String {
        hex::encode(self.signing_key.sign(message).to_bytes())
    }

    /// Set the object's author key to this key and sign its payload
    pub fn sign_object<T: Signable + ?Sized>(&self, object: &mut T) {
        object.set_author_key(self.public_hex());
        let signature = self.sign(&object.signing_payload());
        object.set_signature(signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_domain::{Claim, ClaimId};

    fn claim() -> Claim {
        Claim::new(
            ClaimId::new(),
            "Sky is blue",
            "The daytime sky appears blue due to Rayleigh scattering.",
            vec!["physics".to_string()],
            1,
        )
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = KeyPair::from_secret_bytes([7u8; 32]);
        let mut claim = claim();
        keys.sign_object(&mut claim);

        assert_eq!(claim.author_key.len(), 64);
        assert_eq!(claim.signature.len(), 128);
        assert!(Ed25519Verifier.verify_object(&claim).is_ok());
    }

    #[test]
    fn test_tampered_payload_fails() {
        let keys = KeyPair::generate();
        let mut claim = claim();
        keys.sign_object(&mut claim);
        claim.statement = "The sky is green.".to_string();

        let err = Ed25519Verifier.verify_object(&claim).unwrap_err();
        assert!(matches!(err, GatekeeperError::InvalidSignature(_)));
    }

    #[test]
    fn test_wrong_author_fails() {
        let signer = KeyPair::from_secret_bytes([1u8; 32]);
        let other = KeyPair::from_secret_bytes([2u8; 32]);
        let mut claim = claim();
        signer.sign_object(&mut claim);
        claim.author_key = other.public_hex();

        assert!(matches!(
            Ed25519Verifier.verify_object(&claim),
            Err(GatekeeperError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_malformed_material() {
        let keys = KeyPair::generate();
        let mut claim = claim();
        keys.sign_object(&mut claim);

        let mut bad_key = claim.clone();
        bad_key.author_key = "zz".to_string();
        assert!(matches!(
            Ed25519Verifier.verify_object(&bad_key),
            Err(GatekeeperError::MalformedKey(_))
        ));

        let mut short_sig = claim.clone();
        short_sig.signature = "abcd".to_string();
        assert!(matches!(
            Ed25519Verifier.verify_object(&short_sig),
            Err(GatekeeperError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_secret_hex_roundtrip() {
        let keys = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&keys.secret_hex()).unwrap();
        assert_eq!(keys.public_hex(), restored.public_hex());
        assert!(KeyPair::from_secret_hex("00ff").is_err());
    }

    #[test]
    fn test_digest_and_fingerprint() {
        assert_eq!(payload_digest(b"abc").len(), 64);
        assert_eq!(payload_digest(b"abc"), payload_digest(b"abc"));
        assert_eq!(key_fingerprint("00").len(), 16);
    }
}
