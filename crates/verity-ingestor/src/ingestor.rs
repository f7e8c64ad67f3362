//! Signal admission
//!
//! Checks run in a fixed order and the first failure wins: signature,
//! weight cap, verification confidence, claim existence, claim liveness,
//! argument existence. Every refusal is recorded as a signed
//! `signal_rejected` transparency record; every acceptance is stored
//! together with its `signal_accepted` record.

use crate::config::IngestorConfig;
use crate::error::IngestError;
use crate::metrics::IngestMetrics;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use verity_domain::traits::LedgerStore;
use verity_domain::{
    ClaimId, CounterclaimId, EvidenceId, Fault, PlayfulSignal, ReadOptions, RecordType, SignalId, Signable,
    MAX_SIGNAL_WEIGHT,
};
use verity_gatekeeper::{payload_digest, Gatekeeper, RecordSigner, ValidationStatus};

/// Result of submitting one signal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The signal is stored
    Accepted {
        /// Id of the stored signal
        signal_id: SignalId,
        /// Whether it was already stored by an earlier submission
        duplicate: bool,
    },
    /// The signal was refused and nothing was stored
    Rejected {
        /// Id of the refused signal
        signal_id: SignalId,
        /// Why
        #[serde(serialize_with = "reason_code")]
        reason: IngestError,
    },
}

fn reason_code<S: serde::Serializer>(reason: &IngestError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(reason.kind().as_str())
}

impl IngestOutcome {
    /// Whether the signal ended up stored
    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted { .. })
    }
}

/// Admits playful signals into the ledger
pub struct SignalIngestor<S: LedgerStore> {
    store: Arc<S>,
    gatekeeper: Gatekeeper,
    signer: RecordSigner,
    config: IngestorConfig,
    metrics: Mutex<IngestMetrics>,
}

impl<S: LedgerStore> std::fmt::Debug for SignalIngestor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalIngestor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: LedgerStore> SignalIngestor<S> {
    /// Create an ingestor
    pub fn new(store: Arc<S>, gatekeeper: Gatekeeper, signer: RecordSigner, config: IngestorConfig) -> Self {
        Self {
            store,
            gatekeeper,
            signer,
            config,
            metrics: Mutex::new(IngestMetrics::new()),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &IngestorConfig {
        &self.config
    }

    /// Snapshot of the counters
    pub fn metrics(&self) -> IngestMetrics {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_else(|p| p.into_inner().clone())
    }

    fn update_metrics(&self, f: impl FnOnce(&mut IngestMetrics)) {
        let mut metrics = self.metrics.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut metrics);
    }

    /// Admit one signal
    ///
    /// Refusals come back as [`IngestOutcome::Rejected`]; `Err` is reserved
    /// for store failures, after which nothing has been written.
    pub async fn ingest(&self, signal: PlayfulSignal) -> Result<IngestOutcome, IngestError> {
        let signal_id = signal.id;

        let result = match self.admit(&signal).await {
            Ok(true) => self.store_signal(&signal).await,
            Ok(false) => Ok(false),
            Err(e) => Err(e),
        };

        match result {
            Ok(stored) => {
                if stored {
                    self.update_metrics(|m| m.record_accepted());
                    info!(
                        signal_id = %signal_id,
                        claim_id = %signal.claim_id,
                        weight = signal.weight_applied,
                        "Accepted signal"
                    );
                } else {
                    self.update_metrics(|m| m.record_duplicate());
                    debug!(signal_id = %signal_id, "Duplicate signal submission");
                }
                Ok(IngestOutcome::Accepted {
                    signal_id,
                    duplicate: !stored,
                })
            }
            Err(reason) if reason.is_rejection() => {
                self.update_metrics(|m| m.record_rejection(reason.kind()));
                self.record_rejection(&signal, &reason).await;
                Ok(IngestOutcome::Rejected { signal_id, reason })
            }
            Err(e) => {
                self.update_metrics(|m| m.record_failure());
                warn!(signal_id = %signal_id, error = %e, "Signal ingestion failed");
                Err(e)
            }
        }
    }

    /// Run every check; `Ok(false)` means an identical signal is already
    /// stored
    async fn admit(&self, signal: &PlayfulSignal) -> Result<bool, IngestError> {
        self.gatekeeper.verify_signature(signal)?;

        if let Some(existing) = self.retry(|| self.store.get_signal(signal.id)).await? {
            if existing.signature == signal.signature {
                return Ok(false);
            }
            return Err(IngestError::Conflict(format!(
                "signal {} already exists with a different signature",
                signal.id
            )));
        }

        let weight = signal.weight_applied;
        if !weight.is_finite() || !(0.0..=MAX_SIGNAL_WEIGHT).contains(&weight) {
            return Err(IngestError::WeightCapExceeded {
                weight,
                cap: MAX_SIGNAL_WEIGHT,
            });
        }

        let confidence = signal.verification.confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(IngestError::Validation(format!(
                "verification confidence {} is outside [0, 1]",
                confidence
            )));
        }
        let fields = self.gatekeeper.validate(signal);
        if fields.status == ValidationStatus::Rejected {
            let detail = fields.reasons.iter().map(|r| r.to_string()).collect::<Vec<_>>().join("; ");
            return Err(IngestError::Validation(detail));
        }

        let claim = self
            .retry(|| self.store.get_claim(signal.claim_id, ReadOptions::audit()))
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("claim {}", signal.claim_id)))?;
        if claim.is_deleted() {
            return Err(IngestError::NotFound(format!("claim {} is deleted", signal.claim_id)));
        }

        if !self.argument_exists(signal.claim_id, &signal.argument_id).await? {
            return Err(IngestError::NotFound(format!(
                "argument {} on claim {}",
                signal.argument_id, signal.claim_id
            )));
        }
        Ok(true)
    }

    /// The claim itself, or a live evidence item or counterclaim attached
    /// to it
    async fn argument_exists(&self, claim_id: ClaimId, argument_id: &str) -> Result<bool, IngestError> {
        if argument_id == claim_id.to_string() {
            return Ok(true);
        }
        if let Ok(id) = EvidenceId::from_string(argument_id) {
            let evidence = self.retry(|| self.store.get_evidence(id, ReadOptions::live())).await?;
            if evidence.is_some_and(|e| e.claim_id == claim_id) {
                return Ok(true);
            }
        }
        if let Ok(id) = CounterclaimId::from_string(argument_id) {
            let counterclaim = self
                .retry(|| self.store.get_counterclaim(id, ReadOptions::live()))
                .await?;
            if counterclaim.is_some_and(|c| c.claim_id == claim_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn store_signal(&self, signal: &PlayfulSignal) -> Result<bool, IngestError> {
        let record = self.signer.record(
            RecordType::SignalAccepted,
            vec![signal.id.to_string(), signal.claim_id.to_string(), signal.argument_id.clone()],
            "accepted",
            json!({
                "winner_side": signal.winner_side.as_str(),
                "weight_applied": signal.weight_applied,
                "verification": signal.verification,
                "author_key": signal.author_key,
            }),
            vec![format!(
                "{} signal on argument {} with weight {}",
                signal.winner_side.as_str(),
                signal.argument_id,
                signal.weight_applied
            )],
        );
        self.retry(|| self.store.put_signal(signal, &record)).await
    }

    async fn record_rejection(&self, signal: &PlayfulSignal, reason: &IngestError) {
        let record = self.signer.record(
            RecordType::SignalRejected,
            vec![signal.id.to_string(), signal.claim_id.to_string()],
            "rejected",
            json!({
                "reason": reason.kind().as_str(),
                "author_key": signal.author_key(),
                "payload_digest": payload_digest(&signal.signing_payload()),
                "weight_applied": signal.weight_applied,
            }),
            vec![reason.to_string()],
        );
        if let Err(e) = self.retry(|| self.store.append_record(&record)).await {
            warn!(signal_id = %signal.id, error = %e, "Could not record signal rejection");
        }
    }

    async fn retry<T, F>(&self, mut op: F) -> Result<T, IngestError>
    where
        F: FnMut() -> Result<T, S::Error>,
    {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.store_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "Transient store failure, retrying");
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
                Err(e) => return Err(IngestError::store(&e)),
            }
        }
    }
}
