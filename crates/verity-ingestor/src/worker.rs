//! Background worker draining a bounded signal queue

use crate::error::IngestError;
use crate::ingestor::{IngestOutcome, SignalIngestor};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use verity_domain::traits::LedgerStore;
use verity_domain::PlayfulSignal;

struct IngestJob {
    signal: PlayfulSignal,
    reply: oneshot::Sender<Result<IngestOutcome, IngestError>>,
}

/// Cloneable handle for submitting signals to a running worker
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<IngestJob>,
}

impl std::fmt::Debug for IngestJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestJob").field("signal_id", &self.signal.id).finish()
    }
}

impl IngestHandle {
    /// Queue a signal and wait for the worker's verdict
    ///
    /// Waits for queue space when the worker is saturated.
    pub async fn submit(&self, signal: PlayfulSignal) -> Result<IngestOutcome, IngestError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(IngestJob { signal, reply })
            .await
            .map_err(|_| IngestError::WorkerStopped)?;
        rx.await.map_err(|_| IngestError::WorkerStopped)?
    }

    /// Whether the worker has shut down
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Processes queued signals one at a time, in arrival order
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use verity_gatekeeper::{Gatekeeper, RecordSigner};
/// use verity_ingestor::{IngestWorker, IngestorConfig, SignalIngestor};
/// use verity_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let signer = RecordSigner::ephemeral();
///     let store = Arc::new(SqliteStore::new("verity.db", signer.clone())?);
///     let ingestor = SignalIngestor::new(store, Gatekeeper::default_config(), signer, IngestorConfig::default());
///
///     let (handle, worker) = IngestWorker::spawn(Arc::new(ingestor));
///     // hand `handle` to request handlers...
///     drop(handle);
///     worker.await?;
///     Ok(())
/// }
/// ```
pub struct IngestWorker<S: LedgerStore> {
    ingestor: Arc<SignalIngestor<S>>,
    rx: mpsc::Receiver<IngestJob>,
}

impl<S: LedgerStore + 'static> IngestWorker<S> {
    /// Create a worker and the handle that feeds it
    pub fn new(ingestor: Arc<SignalIngestor<S>>) -> (Self, IngestHandle) {
        let capacity = ingestor.config().queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        (Self { ingestor, rx }, IngestHandle { tx })
    }

    /// Create a worker and run it on the current runtime
    pub fn spawn(ingestor: Arc<SignalIngestor<S>>) -> (IngestHandle, JoinHandle<()>) {
        let (worker, handle) = Self::new(ingestor);
        (handle, tokio::spawn(worker.run()))
    }

    /// Drain the queue until every handle is dropped or Ctrl+C arrives
    pub async fn run(mut self) {
        tracing::info!("Ingest worker started");

        loop {
            tokio::select! {
                job = self.rx.recv() => {
                    let Some(job) = job else {
                        tracing::debug!("All ingest handles dropped");
                        break;
                    };
                    let outcome = self.ingestor.ingest(job.signal).await;
                    if job.reply.send(outcome).is_err() {
                        tracing::debug!("Submitter went away before the verdict");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping ingest worker");
                    break;
                }
            }
        }

        tracing::info!("Ingest worker stopped. Final metrics:\n{}", self.ingestor.metrics().summary());
    }
}
