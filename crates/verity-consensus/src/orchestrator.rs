//! Consensus orchestration
//!
//! Runs one lens against one claim: loads a snapshot from the store,
//! evaluates the lens on a blocking task under a timeout, then activates
//! the resulting report together with its transparency records in a single
//! store transaction. Runs for the same (claim, lens) pair are serialized;
//! runs for different pairs proceed in parallel.

use crate::config::ConsensusConfig;
use crate::error::{ConsensusError, LensError};
use crate::jury::Panel;
use crate::lens::{Lens, LensContext, LensDescriptor, LensParams, LensResult};
use crate::registry::LensRegistry;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use verity_domain::traits::{ClaimQuery, LedgerStore};
use verity_domain::{
    now_millis, Claim, ClaimId, ConfidenceInterval, ConfidenceReport, Fault, ReadOptions, RecordType,
    ReportId, TransparencyRecord,
};
use verity_gatekeeper::RecordSigner;

type PairKey = (ClaimId, String);
type PairLocks = HashMap<PairKey, Arc<tokio::sync::Mutex<()>>>;

/// A claim flagged by [`Orchestrator::disputed`]
#[derive(Debug, Clone, Serialize)]
pub struct DisputedClaim {
    /// The claim, with its active reports
    pub claim: Claim,
    /// Highest active report score, if any report exists
    pub best_score: Option<f64>,
    /// Active, non-deleted counterclaims
    pub active_counterclaims: usize,
    /// Why the claim was flagged
    pub reasons: Vec<String>,
}

/// Coordinates lens runs against a ledger store
pub struct Orchestrator<S: LedgerStore> {
    store: Arc<S>,
    registry: Arc<LensRegistry>,
    signer: RecordSigner,
    config: ConsensusConfig,
    locks: Mutex<PairLocks>,
}

impl<S: LedgerStore> std::fmt::Debug for Orchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: LedgerStore> Orchestrator<S> {
    /// Create an orchestrator
    pub fn new(store: Arc<S>, registry: LensRegistry, signer: RecordSigner, config: ConsensusConfig) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
            signer,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The lens registry
    pub fn registry(&self) -> &LensRegistry {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Descriptors of every registered lens
    pub fn lenses(&self) -> Vec<LensDescriptor> {
        self.registry.descriptors()
    }

    /// Run `lens_id` against `claim_id` and activate the resulting report
    ///
    /// Writes the report, a `lens_run` record and (for jury lenses) a
    /// `jury_composition` record atomically. On any failure nothing is
    /// written and the previously active report stays active.
    pub async fn run_lens(
        &self,
        claim_id: ClaimId,
        lens_id: &str,
        params: LensParams,
    ) -> Result<ConfidenceReport, ConsensusError> {
        let lens = self
            .registry
            .get(lens_id)
            .ok_or_else(|| ConsensusError::LensNotFound(lens_id.to_string()))?;

        let key = (claim_id, lens.descriptor().id.clone());
        let pair_lock = self.pair_lock(&key);
        let outcome = {
            let _guard = pair_lock.lock().await;
            self.run_locked(claim_id, lens, params).await
        };
        self.release_pair(&key, pair_lock);
        outcome
    }

    async fn run_locked(
        &self,
        claim_id: ClaimId,
        lens: Arc<dyn Lens>,
        params: LensParams,
    ) -> Result<ConfidenceReport, ConsensusError> {
        let ctx = self.snapshot(claim_id, params).await?;
        let inputs_seen = json!({
            "evidence_ids": ctx.evidence.iter().map(|e| e.id.to_string()).collect::<Vec<_>>(),
            "counterclaim_ids": ctx.counterclaims.iter().map(|c| c.id.to_string()).collect::<Vec<_>>(),
            "signal_ids": ctx.signals.iter().map(|s| s.id.to_string()).collect::<Vec<_>>(),
        });
        let descriptor = lens.descriptor().clone();

        let result = self.evaluate(lens, ctx).await?;
        let LensResult {
            score,
            confidence,
            inputs,
            dissenting_views,
            panel,
        } = result;

        let report = ConfidenceReport {
            id: ReportId::new(),
            claim_id,
            lens_id: descriptor.id.clone(),
            score,
            confidence,
            interval: ConfidenceInterval::from_score(score, confidence),
            inputs,
            dissenting_views,
            computed_at: now_millis(),
            version: 0,
            is_active: false,
        };

        let mut records = vec![self.lens_run_record(&report, &descriptor, inputs_seen)];
        if let Some(panel) = &panel {
            records.push(self.jury_record(&report, panel));
        }

        let stored = self
            .retry("activate_report", || self.store.activate_report(report.clone(), &records))
            .await?;

        info!(
            claim_id = %claim_id,
            lens_id = %stored.lens_id,
            version = stored.version,
            score = stored.score,
            confidence = stored.confidence,
            "Lens run completed"
        );
        Ok(stored)
    }

    /// Active reports for a live claim, in lens registration order
    pub async fn get_reports(&self, claim_id: ClaimId) -> Result<Vec<ConfidenceReport>, ConsensusError> {
        self.require_live(claim_id).await?;
        let mut reports = self.retry("active_reports", || self.store.active_reports(claim_id)).await?;
        reports.sort_by(|a, b| {
            let pa = self.registry.position(&a.lens_id).unwrap_or(usize::MAX);
            let pb = self.registry.position(&b.lens_id).unwrap_or(usize::MAX);
            pa.cmp(&pb).then_with(|| a.lens_id.cmp(&b.lens_id))
        });
        Ok(reports)
    }

    /// Every report a lens produced for a claim, oldest first
    pub async fn report_history(
        &self,
        claim_id: ClaimId,
        lens_id: &str,
    ) -> Result<Vec<ConfidenceReport>, ConsensusError> {
        if self.registry.get(lens_id).is_none() {
            return Err(ConsensusError::LensNotFound(lens_id.to_string()));
        }
        self.retry("report_history", || self.store.report_history(claim_id, lens_id))
            .await
    }

    /// Live claims whose best active score is below `threshold` or that
    /// carry more active counterclaims than the configured floor
    ///
    /// Ordered by best score ascending; claims without reports come last.
    pub async fn disputed(&self, threshold: Option<f64>, limit: usize) -> Result<Vec<DisputedClaim>, ConsensusError> {
        let threshold = threshold.unwrap_or(self.config.disputed_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConsensusError::InvalidArgument(format!(
                "threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        let floor = self.config.disputed_counterclaim_floor;

        let claims = self
            .retry("query_claims", || {
                self.store.query_claims(&ClaimQuery {
                    heads_only: true,
                    ..Default::default()
                })
            })
            .await?;

        let mut flagged = Vec::new();
        for claim in claims {
            let reports = self.retry("active_reports", || self.store.active_reports(claim.id)).await?;
            let best_score = reports.iter().map(|r| r.score).reduce(f64::max);
            let active_counterclaims = self
                .retry("get_counterclaims_for_claim", || {
                    self.store.get_counterclaims_for_claim(claim.id, ReadOptions::live())
                })
                .await?
                .iter()
                .filter(|c| c.is_active())
                .count();

            let mut reasons = Vec::new();
            if let Some(best) = best_score.filter(|b| *b < threshold) {
                reasons.push(format!("best score {:.3} is below {:.3}", best, threshold));
            }
            if active_counterclaims > floor {
                reasons.push(format!("{} active counterclaims", active_counterclaims));
            }
            if !reasons.is_empty() {
                flagged.push(DisputedClaim {
                    claim,
                    best_score,
                    active_counterclaims,
                    reasons,
                });
            }
        }

        flagged.sort_by(|a, b| match (a.best_score, b.best_score) {
            (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.claim.id.cmp(&b.claim.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.claim.id.cmp(&b.claim.id),
        });
        flagged.truncate(limit);
        debug!(threshold, count = flagged.len(), "Computed disputed claims");
        Ok(flagged)
    }

    fn pair_lock(&self, key: &PairKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(key.clone()).or_default().clone()
    }

    /// Drop the map entry once no other run holds or awaits it
    fn release_pair(&self, key: &PairKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // One reference in the map, one held here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    /// Number of (claim, lens) pairs with a run in flight
    pub fn pairs_in_flight(&self) -> usize {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    async fn require_live(&self, claim_id: ClaimId) -> Result<Claim, ConsensusError> {
        self.retry("get_claim", || self.store.get_claim(claim_id, ReadOptions::live()))
            .await?
            .ok_or_else(|| ConsensusError::NotFound(format!("claim {}", claim_id)))
    }

    async fn snapshot(&self, claim_id: ClaimId, params: LensParams) -> Result<LensContext, ConsensusError> {
        let claim = self.require_live(claim_id).await?;
        let evidence = self
            .retry("get_evidence_for_claim", || {
                self.store.get_evidence_for_claim(claim_id, ReadOptions::live())
            })
            .await?;
        let counterclaims = self
            .retry("get_counterclaims_for_claim", || {
                self.store.get_counterclaims_for_claim(claim_id, ReadOptions::live())
            })
            .await?;
        let signals = self
            .retry("signals_for_claim", || self.store.signals_for_claim(claim_id))
            .await?;

        Ok(LensContext {
            claim,
            evidence,
            counterclaims,
            signals,
            params,
        })
    }

    async fn evaluate(&self, lens: Arc<dyn Lens>, ctx: LensContext) -> Result<LensResult, ConsensusError> {
        let lens_id = lens.descriptor().id.clone();
        let task = tokio::task::spawn_blocking(move || lens.evaluate(&ctx));

        let mut result = match tokio::time::timeout(self.config.lens_timeout(), task).await {
            Err(_) => {
                warn!(lens_id = %lens_id, timeout_ms = self.config.lens_timeout_ms, "Lens timed out");
                return Err(LensError::Unavailable(format!(
                    "lens {} timed out after {}ms",
                    lens_id, self.config.lens_timeout_ms
                ))
                .into());
            }
            Ok(Err(join)) => {
                warn!(lens_id = %lens_id, error = %join, "Lens task failed");
                return Err(LensError::Unavailable(format!("lens {} failed: {}", lens_id, join)).into());
            }
            Ok(Ok(outcome)) => outcome?,
        };

        if !result.score.is_finite() || !result.confidence.is_finite() {
            return Err(LensError::Unavailable(format!(
                "lens {} produced a non-finite score or confidence",
                lens_id
            ))
            .into());
        }
        result.score = result.score.clamp(0.0, 1.0);
        result.confidence = result.confidence.clamp(0.0, 1.0);
        Ok(result)
    }

    fn lens_run_record(
        &self,
        report: &ConfidenceReport,
        descriptor: &LensDescriptor,
        inputs_seen: serde_json::Value,
    ) -> TransparencyRecord {
        let mut explanation = vec![format!(
            "{} scored {:.3} with confidence {:.3}",
            descriptor.name, report.score, report.confidence
        )];
        explanation.extend(report.dissenting_views.iter().cloned());

        self.signer.record(
            RecordType::LensRun,
            vec![report.claim_id.to_string(), report.id.to_string()],
            "report_activated",
            json!({
                "lens_id": descriptor.id,
                "report_id": report.id.to_string(),
                "score": report.score,
                "confidence": report.confidence,
                "interval": report.interval,
                "inputs": report.inputs,
                "snapshot": inputs_seen,
            }),
            explanation,
        )
    }

    fn jury_record(&self, report: &ConfidenceReport, panel: &Panel) -> TransparencyRecord {
        let explanation = panel
            .jurors
            .iter()
            .map(|seat| {
                format!(
                    "{} seated from {} with weight {:.3}",
                    seat.juror.actor_id, seat.juror.diversity_cluster, seat.weight
                )
            })
            .collect();

        self.signer.record(
            RecordType::JuryComposition,
            vec![report.claim_id.to_string(), report.id.to_string()],
            "panel_selected",
            json!({
                "claim_id": panel.claim_id.to_string(),
                "report_id": report.id.to_string(),
                "jurors": panel.jurors,
                "diversity_constraints": {
                    "min_per_cluster": panel.constraints.min_per_cluster,
                    "max_per_cluster": panel.constraints.max_per_cluster,
                    "clusters": panel.constraints.required_clusters,
                    "quorum_percentage": panel.constraints.quorum_percentage,
                    "panel_size": panel.constraints.panel_size,
                },
                "cluster_counts": panel.cluster_counts,
                "coverage": panel.coverage,
            }),
            explanation,
        )
    }

    async fn retry<T, F>(&self, operation: &'static str, mut op: F) -> Result<T, ConsensusError>
    where
        F: FnMut() -> Result<T, S::Error>,
    {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.store_retries => {
                    attempt += 1;
                    warn!(operation, attempt, error = %e, "Transient store failure, retrying");
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
                Err(e) => return Err(ConsensusError::store(&e)),
            }
        }
    }
}
