//! Store failure handling during lens runs

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use verity_consensus::{ConsensusConfig, LensParams, LensRegistry, Orchestrator};
use verity_domain::traits::{ClaimQuery, LedgerStore, ProvenanceStore};
use verity_domain::{
    Attribution, Claim, ClaimId, ConfidenceReport, Counterclaim, CounterclaimId, ErrorKind, Evidence, EvidenceId,
    Fault, Method, ObjectKind, PlayfulSignal, ReadOptions, SignalId, TransparencyRecord,
};
use verity_gatekeeper::{KeyPair, RecordSigner};
use verity_store::{SqliteStore, StoreError};

#[derive(Debug, Error)]
enum FlakyError {
    #[error("database is busy")]
    Busy,

    #[error("database disk image is malformed")]
    Corrupt,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Fault for FlakyError {
    fn kind(&self) -> ErrorKind {
        match self {
            FlakyError::Busy | FlakyError::Corrupt => ErrorKind::Storage,
            FlakyError::Store(e) => e.kind(),
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            FlakyError::Busy => true,
            FlakyError::Corrupt => false,
            FlakyError::Store(e) => e.is_transient(),
        }
    }
}

/// SQLite store whose report activation can be made to fail
struct FlakyStore {
    inner: SqliteStore,
    busy_failures: AtomicUsize,
    corrupt: AtomicBool,
    activation_attempts: AtomicUsize,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: SqliteStore::new(":memory:", engine()).unwrap(),
            busy_failures: AtomicUsize::new(0),
            corrupt: AtomicBool::new(false),
            activation_attempts: AtomicUsize::new(0),
        }
    }

    fn attempts(&self) -> usize {
        self.activation_attempts.load(Ordering::SeqCst)
    }
}

impl ProvenanceStore for FlakyStore {
    type Error = FlakyError;

    fn put_claim(&self, claim: Claim) -> Result<Claim, Self::Error> {
        Ok(self.inner.put_claim(claim)?)
    }

    fn put_evidence(&self, evidence: Evidence) -> Result<Evidence, Self::Error> {
        Ok(self.inner.put_evidence(evidence)?)
    }

    fn put_counterclaim(&self, counterclaim: Counterclaim) -> Result<Counterclaim, Self::Error> {
        Ok(self.inner.put_counterclaim(counterclaim)?)
    }

    fn put_method(&self, method: Method) -> Result<Method, Self::Error> {
        Ok(self.inner.put_method(method)?)
    }

    fn put_attribution(&self, attribution: Attribution) -> Result<Attribution, Self::Error> {
        Ok(self.inner.put_attribution(attribution)?)
    }

    fn get_claim(&self, id: ClaimId, opts: ReadOptions) -> Result<Option<Claim>, Self::Error> {
        Ok(self.inner.get_claim(id, opts)?)
    }

    fn get_evidence(&self, id: EvidenceId, opts: ReadOptions) -> Result<Option<Evidence>, Self::Error> {
        Ok(self.inner.get_evidence(id, opts)?)
    }

    fn get_counterclaim(&self, id: CounterclaimId, opts: ReadOptions) -> Result<Option<Counterclaim>, Self::Error> {
        Ok(self.inner.get_counterclaim(id, opts)?)
    }

    fn get_evidence_for_claim(&self, claim_id: ClaimId, opts: ReadOptions) -> Result<Vec<Evidence>, Self::Error> {
        Ok(self.inner.get_evidence_for_claim(claim_id, opts)?)
    }

    fn get_counterclaims_for_claim(
        &self,
        claim_id: ClaimId,
        opts: ReadOptions,
    ) -> Result<Vec<Counterclaim>, Self::Error> {
        Ok(self.inner.get_counterclaims_for_claim(claim_id, opts)?)
    }

    fn get_methods_for_claim(&self, claim_id: ClaimId, opts: ReadOptions) -> Result<Vec<Method>, Self::Error> {
        Ok(self.inner.get_methods_for_claim(claim_id, opts)?)
    }

    fn get_attributions_for_claim(
        &self,
        claim_id: ClaimId,
        opts: ReadOptions,
    ) -> Result<Vec<Attribution>, Self::Error> {
        Ok(self.inner.get_attributions_for_claim(claim_id, opts)?)
    }

    fn get_lineage(&self, id: ClaimId) -> Result<Vec<Claim>, Self::Error> {
        Ok(self.inner.get_lineage(id)?)
    }

    fn current_version(&self, id: ClaimId) -> Result<Claim, Self::Error> {
        Ok(self.inner.current_version(id)?)
    }

    fn mark_deleted(&self, kind: ObjectKind, id: &str, actor: &str) -> Result<bool, Self::Error> {
        Ok(self.inner.mark_deleted(kind, id, actor)?)
    }

    fn query_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, Self::Error> {
        Ok(self.inner.query_claims(query)?)
    }
}

impl LedgerStore for FlakyStore {
    fn activate_report(
        &self,
        report: ConfidenceReport,
        records: &[TransparencyRecord],
    ) -> Result<ConfidenceReport, Self::Error> {
        self.activation_attempts.fetch_add(1, Ordering::SeqCst);
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(FlakyError::Corrupt);
        }
        let pending = self.busy_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.busy_failures.store(pending - 1, Ordering::SeqCst);
            return Err(FlakyError::Busy);
        }
        Ok(self.inner.activate_report(report, records)?)
    }

    fn active_reports(&self, claim_id: ClaimId) -> Result<Vec<ConfidenceReport>, Self::Error> {
        Ok(self.inner.active_reports(claim_id)?)
    }

    fn report_history(&self, claim_id: ClaimId, lens_id: &str) -> Result<Vec<ConfidenceReport>, Self::Error> {
        Ok(self.inner.report_history(claim_id, lens_id)?)
    }

    fn append_record(&self, record: &TransparencyRecord) -> Result<(), Self::Error> {
        Ok(self.inner.append_record(record)?)
    }

    fn records_for_subject(&self, subject: &str, limit: usize) -> Result<Vec<TransparencyRecord>, Self::Error> {
        Ok(self.inner.records_for_subject(subject, limit)?)
    }

    fn put_signal(&self, signal: &PlayfulSignal, record: &TransparencyRecord) -> Result<bool, Self::Error> {
        Ok(self.inner.put_signal(signal, record)?)
    }

    fn get_signal(&self, id: SignalId) -> Result<Option<PlayfulSignal>, Self::Error> {
        Ok(self.inner.get_signal(id)?)
    }

    fn signals_for_claim(&self, claim_id: ClaimId) -> Result<Vec<PlayfulSignal>, Self::Error> {
        Ok(self.inner.signals_for_claim(claim_id)?)
    }
}

fn engine() -> RecordSigner {
    RecordSigner::new(KeyPair::from_secret_bytes([4u8; 32]))
}

fn setup() -> (Arc<FlakyStore>, Orchestrator<FlakyStore>, ClaimId) {
    let store = Arc::new(FlakyStore::new());
    let mut claim = Claim::new(ClaimId::new(), "Retried", "Retried statement", vec![], 1_000);
    KeyPair::from_secret_bytes([40u8; 32]).sign_object(&mut claim);
    let claim_id = store.put_claim(claim).unwrap().id;

    let config = ConsensusConfig {
        store_retries: 3,
        retry_backoff_ms: 1,
        ..ConsensusConfig::default()
    };
    let orchestrator = Orchestrator::new(store.clone(), LensRegistry::with_default_lenses(), engine(), config);
    (store, orchestrator, claim_id)
}

#[tokio::test]
async fn test_transient_activation_failure_is_retried() {
    let (store, orchestrator, claim_id) = setup();
    store.busy_failures.store(1, Ordering::SeqCst);

    let report = orchestrator
        .run_lens(claim_id, "L1_evidence_first", LensParams::default())
        .await
        .unwrap();

    assert_eq!(report.version, 1);
    assert_eq!(store.attempts(), 2);
    let active = store.active_reports(claim_id).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, report.id);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (store, orchestrator, claim_id) = setup();
    store.busy_failures.store(10, Ordering::SeqCst);

    let err = orchestrator
        .run_lens(claim_id, "L1_evidence_first", LensParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(store.attempts(), 4);
    assert!(store.active_reports(claim_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let (store, orchestrator, claim_id) = setup();
    store.corrupt.store(true, Ordering::SeqCst);

    let err = orchestrator
        .run_lens(claim_id, "L1_evidence_first", LensParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(store.attempts(), 1);
    assert!(store.active_reports(claim_id).unwrap().is_empty());
}
