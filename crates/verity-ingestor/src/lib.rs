//! Verity Ingestor
//!
//! Admission of playful signals: outcomes of verified games or disputes
//! that nudge a claim's market lens. Each signal carries at most 2% of
//! influence, must be signed by its submitter, and must point at a live
//! claim and a live argument of that claim.
//!
//! The ingestor can be called directly, or fed through an
//! [`IngestWorker`] that drains a bounded queue and answers each submitter
//! over a oneshot channel.

#![warn(missing_docs)]

mod config;
mod error;
mod ingestor;
mod metrics;
mod worker;

pub use config::IngestorConfig;
pub use error::IngestError;
pub use ingestor::{IngestOutcome, SignalIngestor};
pub use metrics::IngestMetrics;
pub use worker::{IngestHandle, IngestWorker};
