//! Canonical signing payloads
//!
//! Every signed object encodes to `verity:<kind>:v1\0` followed by the
//! compact JSON of a payload struct with a fixed field order. Read-side
//! fields (reference lists, embedded reports, tombstones) never enter the
//! payload, so they can change without invalidating the signature.

use serde::Serialize;

/// An object carrying an author key and a detached signature over its
/// canonical payload
pub trait Signable {
    /// Short object kind used for domain separation (e.g. "claim")
    fn kind(&self) -> &'static str;

    /// Canonical bytes the signature covers
    fn signing_payload(&self) -> Vec<u8>;

    /// Hex-encoded Ed25519 public key of the author
    fn author_key(&self) -> &str;

    /// Hex-encoded detached signature
    fn signature(&self) -> &str;

    /// Set the author key (must happen before computing the payload)
    fn set_author_key(&mut self, key: String);

    /// Attach a signature
    fn set_signature(&mut self, signature: String);
}

/// Encode a payload with its domain-separation prefix
pub fn canonical_bytes<T: Serialize>(kind: &str, payload: &T) -> Vec<u8> {
    let mut bytes = format!("verity:{}:v1\0", kind).into_bytes();
    // Payload structs hold only strings, numbers, options and vectors,
    // which cannot fail to serialize.
    if let Ok(json) = serde_json::to_vec(payload) {
        bytes.extend_from_slice(&json);
    }
    bytes
}

/// Implement [`Signable`] for a struct with `author_key` and `signature`
/// fields and a `payload()` method returning a serializable view.
#[macro_export]
macro_rules! impl_signable {
    ($ty:ty, $kind:expr) => {
        impl $crate::signing::Signable for $ty {
            fn kind(&self) -> &'static str {
                $kind
            }

            fn signing_payload(&self) -> Vec<u8> {
                $crate::signing::canonical_bytes($kind, &self.payload())
            }

            fn author_key(&self) -> &str {
                &self.author_key
            }

            fn signature(&self) -> &str {
                &self.signature
            }

            fn set_author_key(&mut self, key: String) {
                self.author_key = key;
            }

            fn set_signature(&mut self, signature: String) {
                self.signature = signature;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample<'a> {
        a: &'a str,
        b: u32,
    }

    #[test]
    fn test_domain_prefix() {
        let bytes = canonical_bytes("claim", &Sample { a: "x", b: 1 });
        assert!(bytes.starts_with(b"verity:claim:v1\0"));
        assert!(bytes.ends_with(br#"{"a":"x","b":1}"#));
    }

    #[test]
    fn test_kinds_are_separated() {
        let sample = Sample { a: "x", b: 1 };
        assert_ne!(canonical_bytes("claim", &sample), canonical_bytes("evidence", &sample));
    }
}
