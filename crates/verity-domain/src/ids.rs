//! Identifier types for every object in the provenance graph
//!
//! All ids are UUIDv7 values. Clients mint ids for the objects they submit
//! (claims, evidence, counterclaims, methods, attributions, signals), which
//! makes retried submissions idempotent; the engine mints ids for the
//! reports and records it writes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based id
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an id from a raw u128 value
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an id from its hyphenated UUID string form
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid {} '{}': {}", stringify!($name), s, e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Milliseconds since Unix epoch encoded in the top 48 bits
            pub fn timestamp(&self) -> u64 {
                (self.0 >> 80) as u64
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_string(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Identifier of one immutable claim version
    ClaimId
);
define_id!(
    /// Identifier of an evidence item
    EvidenceId
);
define_id!(
    /// Identifier of a counterclaim
    CounterclaimId
);
define_id!(
    /// Identifier of a method description
    MethodId
);
define_id!(
    /// Identifier of an attribution
    AttributionId
);
define_id!(
    /// Identifier of a confidence report (engine-minted)
    ReportId
);
define_id!(
    /// Identifier of a transparency record (engine-minted)
    RecordId
);
define_id!(
    /// Identifier of a playful signal
    SignalId
);

/// Current wall-clock time in milliseconds since Unix epoch
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering() {
        let id1 = ClaimId::from_value(1000);
        let id2 = ClaimId::from_value(2000);

        assert!(id1 < id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_id_chronological() {
        let id1 = EvidenceId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = EvidenceId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should be less than later UUIDv7");
        assert!(id1.timestamp() <= id2.timestamp());
    }

    #[test]
    fn test_display_and_parse() {
        let id = SignalId::new();
        let id_str = id.to_string();

        assert_eq!(id_str.len(), 36);
        assert_eq!(SignalId::from_string(&id_str).unwrap(), id);
    }

    #[test]
    fn test_invalid_string() {
        assert!(ClaimId::from_string("not-a-valid-uuid").is_err());
        assert!(ClaimId::from_string("").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = ClaimId::from_value(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let back: ClaimId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<ClaimId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
