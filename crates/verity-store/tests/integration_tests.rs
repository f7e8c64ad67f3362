//! Integration tests for verity-store
//!
//! These tests exercise the full write/read cycle for claims, attached
//! objects, reports, records and signals.

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use verity_domain::traits::{ClaimQuery, LedgerStore, ProvenanceStore};
use verity_domain::{
    Claim, ClaimId, ConfidenceInterval, ConfidenceReport, Counterclaim, CounterclaimId, ErrorKind, Evidence,
    EvidenceId, EvidenceKind, Fault, Method, MethodId, ObjectKind, PlayfulSignal, ReadOptions, RecordType, ReportId,
    SignalId, SignalVerification, Stance, VerificationStatus, WinnerSide,
};
use verity_gatekeeper::{KeyPair, RecordSigner};
use verity_store::{SqliteStore, StoreError};

fn author() -> KeyPair {
    KeyPair::from_secret_bytes([11u8; 32])
}

fn engine() -> RecordSigner {
    RecordSigner::new(KeyPair::from_secret_bytes([1u8; 32]))
}

fn store() -> SqliteStore {
    SqliteStore::new(":memory:", engine()).unwrap()
}

fn signed_claim(title: &str, tags: &[&str]) -> Claim {
    let mut claim = Claim::new(
        ClaimId::new(),
        title,
        format!("{} (statement)", title),
        tags.iter().map(|t| t.to_string()),
        1_000,
    );
    author().sign_object(&mut claim);
    claim
}

fn signed_revision(parent: &Claim, title: &str) -> Claim {
    let mut next = parent.revise(ClaimId::new(), title, format!("{} (revised)", title), parent.created_at + 1);
    author().sign_object(&mut next);
    next
}

fn signed_evidence(claim_id: ClaimId, stance: Stance, quality: f64) -> Evidence {
    let mut evidence = Evidence::new(
        EvidenceId::new(),
        claim_id,
        EvidenceKind::PrimarySource,
        "https://example.org/source",
        stance,
        quality,
        2_000,
    );
    author().sign_object(&mut evidence);
    evidence
}

fn report(claim_id: ClaimId, lens_id: &str, score: f64) -> ConfidenceReport {
    ConfidenceReport {
        id: ReportId::new(),
        claim_id,
        lens_id: lens_id.to_string(),
        score,
        confidence: 0.5,
        interval: ConfidenceInterval::from_score(score, 0.5),
        inputs: BTreeMap::new(),
        dissenting_views: vec![],
        computed_at: 3_000,
        version: 0,
        is_active: false,
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:", engine());
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_put_and_get_claim() {
    let store = store();
    let claim = signed_claim("Water boils at 100C", &["physics"]);

    let stored = store.put_claim(claim.clone()).unwrap();
    assert_eq!(stored.id, claim.id);

    let retrieved = store.get_claim(claim.id, ReadOptions::live()).unwrap().unwrap();
    assert_eq!(retrieved.title, claim.title);
    assert_eq!(retrieved.statement, claim.statement);
    assert_eq!(retrieved.topic_tags, claim.topic_tags);
    assert_eq!(retrieved.signature, claim.signature);
    assert_eq!(retrieved.version, 1);
    assert!(retrieved.evidence_refs.is_empty());
}

#[test]
fn test_invalid_signature_creates_no_row() {
    let store = store();
    let mut claim = signed_claim("Original", &[]);
    claim.statement = "Tampered after signing".to_string();

    let err = store.put_claim(claim.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    assert!(store.get_claim(claim.id, ReadOptions::audit()).unwrap().is_none());

    let records = store.records_for_subject(&claim.id.to_string(), 10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_type, RecordType::WriteRejected);
    assert_eq!(records[0].decision, "rejected: invalid_signature");
}

#[test]
fn test_duplicate_submission_is_idempotent() {
    let store = store();
    let claim = signed_claim("Idempotent", &[]);

    store.put_claim(claim.clone()).unwrap();
    let again = store.put_claim(claim.clone()).unwrap();
    assert_eq!(again.id, claim.id);
    assert_eq!(store.query_claims(&ClaimQuery::default()).unwrap().len(), 1);
}

#[test]
fn test_same_id_different_signature_conflicts() {
    let store = store();
    let claim = signed_claim("First", &[]);
    store.put_claim(claim.clone()).unwrap();

    let mut other = claim.clone();
    other.title = "Second".to_string();
    author().sign_object(&mut other);

    let err = store.put_claim(other).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn test_revision_chain_and_lineage() {
    let store = store();
    let v1 = signed_claim("v1", &[]);
    let v2 = signed_revision(&v1, "v2");
    let v3 = signed_revision(&v2, "v3");

    store.put_claim(v1.clone()).unwrap();
    store.put_claim(v2.clone()).unwrap();
    store.put_claim(v3.clone()).unwrap();

    let lineage = store.get_lineage(v3.id).unwrap();
    let ids: Vec<ClaimId> = lineage.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![v1.id, v2.id]);

    // The old version is never mutated
    let old = store.get_claim(v1.id, ReadOptions::live()).unwrap().unwrap();
    assert_eq!(old.title, "v1");

    assert_eq!(store.current_version(v1.id).unwrap().id, v3.id);

    store.mark_deleted(ObjectKind::Claim, &v3.id.to_string(), "moderator").unwrap();
    assert_eq!(store.current_version(v1.id).unwrap().id, v2.id);
}

#[test]
fn test_unknown_parent() {
    let store = store();
    let ghost = signed_claim("never stored", &[]);
    let orphan = signed_revision(&ghost, "orphan");

    let err = store.put_claim(orphan).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownParent);
}

#[test]
fn test_broken_lineage_rejected() {
    let store = store();
    let v1 = signed_claim("v1", &[]);
    store.put_claim(v1.clone()).unwrap();

    let mut bad = v1.revise(ClaimId::new(), "bad", "bad", 5);
    bad.lineage.push(bad.id);
    author().sign_object(&mut bad);
    assert_eq!(store.put_claim(bad).unwrap_err().kind(), ErrorKind::LineageCycle);

    let mut wrong_version = v1.revise(ClaimId::new(), "bad", "bad", 5);
    wrong_version.version = 7;
    author().sign_object(&mut wrong_version);
    assert_eq!(store.put_claim(wrong_version).unwrap_err().kind(), ErrorKind::LineageCycle);
}

#[test]
fn test_second_revision_of_same_parent_conflicts() {
    let store = store();
    let v1 = signed_claim("v1", &[]);
    store.put_claim(v1.clone()).unwrap();
    store.put_claim(signed_revision(&v1, "branch a")).unwrap();

    let err = store.put_claim(signed_revision(&v1, "branch b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_evidence_and_soft_delete() {
    let store = store();
    let claim = signed_claim("With evidence", &[]);
    store.put_claim(claim.clone()).unwrap();

    let evidence = signed_evidence(claim.id, Stance::Supports, 0.9);
    store.put_evidence(evidence.clone()).unwrap();

    let read = store.get_claim(claim.id, ReadOptions::live()).unwrap().unwrap();
    assert_eq!(read.evidence_refs, vec![evidence.id]);

    assert!(store
        .mark_deleted(ObjectKind::Evidence, &evidence.id.to_string(), "moderator")
        .unwrap());
    assert!(!store
        .mark_deleted(ObjectKind::Evidence, &evidence.id.to_string(), "moderator")
        .unwrap());

    assert!(store.get_evidence_for_claim(claim.id, ReadOptions::live()).unwrap().is_empty());
    let audit = store.get_evidence_for_claim(claim.id, ReadOptions::audit()).unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].deleted.as_ref().unwrap().deleted_by, "moderator");

    let records = store.records_for_subject(&evidence.id.to_string(), 10).unwrap();
    assert_eq!(records[0].record_type, RecordType::ObjectDeleted);
    assert!(records[0].concerns(&claim.id.to_string()));
}

#[test]
fn test_deleted_claim_hidden_by_default() {
    let store = store();
    let claim = signed_claim("Hidden", &[]);
    store.put_claim(claim.clone()).unwrap();
    store.mark_deleted(ObjectKind::Claim, &claim.id.to_string(), "admin").unwrap();

    assert!(store.get_claim(claim.id, ReadOptions::live()).unwrap().is_none());
    let audited = store.get_claim(claim.id, ReadOptions::audit()).unwrap().unwrap();
    assert!(audited.is_deleted());

    let err = store.put_evidence(signed_evidence(claim.id, Stance::Supports, 0.5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_attachments_require_claim() {
    let store = store();
    let err = store
        .put_evidence(signed_evidence(ClaimId::new(), Stance::Supports, 0.5))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let claim = signed_claim("Counterclaimed", &[]);
    store.put_claim(claim.clone()).unwrap();

    let mut counterclaim = Counterclaim::new(CounterclaimId::new(), claim.id, "Not at altitude", 0.7, 5);
    counterclaim.evidence_refs.push(EvidenceId::new());
    author().sign_object(&mut counterclaim);
    assert_eq!(store.put_counterclaim(counterclaim).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_references_must_share_the_claim() {
    let store = store();
    let home = signed_claim("Home", &[]);
    let elsewhere = signed_claim("Elsewhere", &[]);
    store.put_claim(home.clone()).unwrap();
    store.put_claim(elsewhere.clone()).unwrap();

    let foreign_evidence = store
        .put_evidence(signed_evidence(elsewhere.id, Stance::Supports, 0.8))
        .unwrap();
    let mut counterclaim = Counterclaim::new(CounterclaimId::new(), home.id, "Borrowed citation", 0.5, 5);
    counterclaim.evidence_refs.push(foreign_evidence.id);
    author().sign_object(&mut counterclaim);
    let err = store.put_counterclaim(counterclaim).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(store
        .get_counterclaims_for_claim(home.id, ReadOptions::audit())
        .unwrap()
        .is_empty());

    let mut foreign_method = Method::new(MethodId::new(), elsewhere.id, "Survey", 6);
    author().sign_object(&mut foreign_method);
    let foreign_method = store.put_method(foreign_method).unwrap();
    let mut evidence = Evidence::new(
        EvidenceId::new(),
        home.id,
        EvidenceKind::Dataset,
        "https://example.org/data",
        Stance::Supports,
        0.7,
        7,
    );
    evidence.method_id = Some(foreign_method.id);
    author().sign_object(&mut evidence);
    assert_eq!(store.put_evidence(evidence).unwrap_err().kind(), ErrorKind::NotFound);

    // Same-claim references are accepted
    let own_evidence = store.put_evidence(signed_evidence(home.id, Stance::Contradicts, 0.6)).unwrap();
    let mut counterclaim = Counterclaim::new(CounterclaimId::new(), home.id, "Own citation", 0.5, 8);
    counterclaim.evidence_refs.push(own_evidence.id);
    author().sign_object(&mut counterclaim);
    store.put_counterclaim(counterclaim).unwrap();
}

#[test]
fn test_methods_and_counterclaims_listed() {
    let store = store();
    let claim = signed_claim("Method backed", &[]);
    store.put_claim(claim.clone()).unwrap();

    let mut method = Method::new(MethodId::new(), claim.id, "Double-blind trial", 10);
    author().sign_object(&mut method);
    store.put_method(method.clone()).unwrap();

    let mut counterclaim = Counterclaim::new(CounterclaimId::new(), claim.id, "Sample too small", 0.4, 11);
    author().sign_object(&mut counterclaim);
    store.put_counterclaim(counterclaim.clone()).unwrap();

    let read = store.get_claim(claim.id, ReadOptions::live()).unwrap().unwrap();
    assert_eq!(read.method_refs, vec![method.id]);
    assert_eq!(read.counterclaim_refs, vec![counterclaim.id]);
    assert_eq!(
        store.get_counterclaim(counterclaim.id, ReadOptions::live()).unwrap().unwrap().statement,
        "Sample too small"
    );
}

#[test]
fn test_query_claims_by_topic_and_text() {
    let store = store();
    store.put_claim(signed_claim("Coffee has caffeine", &["nutrition"])).unwrap();
    store.put_claim(signed_claim("Tea has caffeine", &["nutrition", "tea"])).unwrap();
    store.put_claim(signed_claim("Mars is red", &["astronomy"])).unwrap();

    let nutrition = store
        .query_claims(&ClaimQuery {
            topic: Some("nutrition".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(nutrition.len(), 2);

    let tea = store
        .query_claims(&ClaimQuery {
            text: Some("Tea".to_string()),
            limit: Some(5),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(tea.len(), 1);
    assert_eq!(tea[0].title, "Tea has caffeine");
}

#[test]
fn test_report_supersession() {
    let store = store();
    let claim = signed_claim("Scored", &[]);
    store.put_claim(claim.clone()).unwrap();

    for score in [0.2, 0.5, 0.8] {
        store.activate_report(report(claim.id, "L1_evidence_first", score), &[]).unwrap();
    }
    store.activate_report(report(claim.id, "L4_market_signal", 0.5), &[]).unwrap();

    let history = store.report_history(claim.id, "L1_evidence_first").unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.iter().map(|r| r.version).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(history.iter().filter(|r| r.is_active).count(), 1);
    assert!(history[2].is_active);

    let active = store.active_reports(claim.id).unwrap();
    assert_eq!(active.len(), 2);

    let read = store.get_claim(claim.id, ReadOptions::live()).unwrap().unwrap();
    assert_eq!(read.confidence_reports.len(), 2);
}

#[test]
fn test_report_and_records_written_together() {
    let store = store();
    let claim = signed_claim("Audited", &[]);
    store.put_claim(claim.clone()).unwrap();

    let record = engine().record(
        RecordType::LensRun,
        vec![claim.id.to_string()],
        "report_activated",
        json!({"score": 0.6}),
        vec![],
    );
    store.activate_report(report(claim.id, "L1_evidence_first", 0.6), &[record]).unwrap();
    assert_eq!(store.records_for_subject(&claim.id.to_string(), 10).unwrap().len(), 1);

    // An unsigned record aborts the whole activation
    let mut forged = engine().record(RecordType::LensRun, vec![claim.id.to_string()], "x", json!({}), vec![]);
    forged.decision = "forged".to_string();
    let err = store
        .activate_report(report(claim.id, "L1_evidence_first", 0.9), &[forged])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    assert_eq!(store.report_history(claim.id, "L1_evidence_first").unwrap().len(), 1);
}

#[test]
fn test_signals_are_idempotent() {
    let store = store();
    let claim = signed_claim("Debated", &[]);
    store.put_claim(claim.clone()).unwrap();

    let mut signal = PlayfulSignal::new(
        SignalId::new(),
        claim.id,
        claim.id.to_string(),
        WinnerSide::Pro,
        SignalVerification {
            method: "automated_scoring".to_string(),
            status: VerificationStatus::Verified,
            confidence: 0.8,
            dispute_id: "dispute-1".to_string(),
            game_type: None,
        },
        0.01,
        4_000,
    );
    author().sign_object(&mut signal);
    let record = engine().record(
        RecordType::SignalAccepted,
        vec![signal.id.to_string(), claim.id.to_string()],
        "accepted",
        json!({}),
        vec![],
    );

    assert!(store.put_signal(&signal, &record).unwrap());
    assert!(!store.put_signal(&signal, &record).unwrap());
    assert_eq!(store.signals_for_claim(claim.id).unwrap().len(), 1);
    assert_eq!(store.get_signal(signal.id).unwrap().unwrap().weight_applied, 0.01);
}

#[test]
fn test_on_disk_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verity.db");
    let claim = signed_claim("Durable", &["storage"]);

    {
        let store = SqliteStore::new(&path, engine()).unwrap();
        store.put_claim(claim.clone()).unwrap();
    }

    let reopened = SqliteStore::new(&path, engine()).unwrap();
    let read = reopened.get_claim(claim.id, ReadOptions::live()).unwrap().unwrap();
    assert_eq!(read.topic_tags, claim.topic_tags);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Walking prev_id from any version visits every ancestor exactly once
    #[test]
    fn test_lineage_walk_terminates(len in 1usize..8) {
        let store = store();
        let mut chain = vec![signed_claim("root", &[])];
        for i in 1..len {
            let next = signed_revision(&chain[i - 1], &format!("v{}", i + 1));
            chain.push(next);
        }
        for claim in &chain {
            store.put_claim(claim.clone()).unwrap();
        }

        for (i, claim) in chain.iter().enumerate() {
            let lineage = store.get_lineage(claim.id).unwrap();
            let ids: Vec<ClaimId> = lineage.iter().map(|c| c.id).collect();
            let expected: Vec<ClaimId> = chain[..i].iter().map(|c| c.id).collect();
            prop_assert_eq!(ids, expected);
        }
        prop_assert_eq!(store.current_version(chain[0].id).unwrap().id, chain[len - 1].id);
    }
}
