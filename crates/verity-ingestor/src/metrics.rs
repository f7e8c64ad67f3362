//! Metrics collected during signal ingestion

use std::collections::BTreeMap;
use verity_domain::ErrorKind;

/// Counters for accepted, duplicate and rejected signals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestMetrics {
    /// Newly stored signals
    pub accepted: usize,

    /// Resubmissions answered with the stored signal
    pub duplicates: usize,

    /// Rejections per reason code
    pub rejected: BTreeMap<&'static str, usize>,

    /// Ingestions that failed on the store
    pub failures: usize,
}

impl IngestMetrics {
    /// Create empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly stored signal
    pub fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    /// Record a duplicate submission
    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    /// Record a rejection
    pub fn record_rejection(&mut self, kind: ErrorKind) {
        *self.rejected.entry(kind.as_str()).or_insert(0) += 1;
    }

    /// Record a store failure
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Total rejections across all reasons
    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Ingest Metrics Summary".to_string(),
            format!("  Accepted: {}", self.accepted),
            format!("  Duplicates: {}", self.duplicates),
            format!("  Rejected: {}", self.total_rejected()),
        ];
        for (reason, count) in &self.rejected {
            lines.push(format!("    {}: {}", reason, count));
        }
        lines.push(format!("  Store failures: {}", self.failures));
        lines.join("\n")
    }
}
