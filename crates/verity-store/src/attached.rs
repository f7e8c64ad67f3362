//! Objects that hang off exactly one claim
//!
//! Evidence, counterclaims, methods and attributions share one storage
//! shape: key columns for lookups plus the signed body as JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;
use verity_domain::{Attribution, ClaimId, Counterclaim, Evidence, Method, ObjectKind, Signable, Tombstone};
use verity_gatekeeper::Validate;

/// A signed object attached to a claim
pub(crate) trait Attached: Serialize + DeserializeOwned + Signable + Validate + Clone {
    /// Table holding this kind
    const TABLE: &'static str;

    /// Kind used in soft deletes and records
    const KIND: ObjectKind;

    /// Canonical string id
    fn id_string(&self) -> String;

    /// Owning claim
    fn claim_id(&self) -> ClaimId;

    /// Creation time (Unix millis)
    fn created_at(&self) -> u64;

    /// Replace the soft-delete marker
    fn set_deleted(&mut self, deleted: Option<Tombstone>);

    /// Other objects this one references, as (table, id) pairs
    fn references(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl Attached for Evidence {
    const TABLE: &'static str = "evidence";
    const KIND: ObjectKind = ObjectKind::Evidence;

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn claim_id(&self) -> ClaimId {
        self.claim_id
    }

    fn created_at(&self) -> u64 {
        self.created_at
    }

    fn set_deleted(&mut self, deleted: Option<Tombstone>) {
        self.deleted = deleted;
    }

    fn references(&self) -> Vec<(&'static str, String)> {
        self.method_id
            .iter()
            .map(|m| (Method::TABLE, m.to_string()))
            .collect()
    }
}

impl Attached for Counterclaim {
    const TABLE: &'static str = "counterclaims";
    const KIND: ObjectKind = ObjectKind::Counterclaim;

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn claim_id(&self) -> ClaimId {
        self.claim_id
    }

    fn created_at(&self) -> u64 {
        self.created_at
    }

    fn set_deleted(&mut self, deleted: Option<Tombstone>) {
        self.deleted = deleted;
    }

    fn references(&self) -> Vec<(&'static str, String)> {
        self.evidence_refs
            .iter()
            .map(|e| (Evidence::TABLE, e.to_string()))
            .collect()
    }
}

impl Attached for Method {
    const TABLE: &'static str = "methods";
    const KIND: ObjectKind = ObjectKind::Method;

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn claim_id(&self) -> ClaimId {
        self.claim_id
    }

    fn created_at(&self) -> u64 {
        self.created_at
    }

    fn set_deleted(&mut self, deleted: Option<Tombstone>) {
        self.deleted = deleted;
    }
}

impl Attached for Attribution {
    const TABLE: &'static str = "attributions";
    const KIND: ObjectKind = ObjectKind::Attribution;

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn claim_id(&self) -> ClaimId {
        self.claim_id
    }

    fn created_at(&self) -> u64 {
        self.created_at
    }

    fn set_deleted(&mut self, deleted: Option<Tombstone>) {
        self.deleted = deleted;
    }
}

/// Table name for a soft-deletable kind
pub(crate) fn table_for(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Claim => "claims",
        ObjectKind::Evidence => Evidence::TABLE,
        ObjectKind::Counterclaim => Counterclaim::TABLE,
        ObjectKind::Method => Method::TABLE,
        ObjectKind::Attribution => Attribution::TABLE,
    }
}
