//! Verity Router
//!
//! HTTP surface over the provenance store, the consensus orchestrator
//! and the signal ingestor. Sessions are JWT bearer tokens; soft deletes
//! and audit reads require the admin role.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod session;

use config::RouterConfig;
use handlers::{create_router, AppState};
use session::SessionManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use verity_consensus::{LensRegistry, Orchestrator};
use verity_gatekeeper::{Gatekeeper, GatekeeperError, KeyPair, RecordSigner};
use verity_ingestor::{IngestWorker, SignalIngestor};
use verity_store::{SqliteStore, StoreError};

/// Router error
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Engine signing key could not be loaded
    #[error("Signing key error: {0}")]
    Key(#[from] GatekeeperError),

    /// Store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Wire the store, orchestrator, ingestor worker and session manager
///
/// Spawns the ingestor worker, so this must run inside a tokio runtime.
pub fn build_state(config: &RouterConfig) -> Result<AppState, RouterError> {
    config.validate()?;

    let signer = match &config.signing_key_hex {
        Some(hex) => RecordSigner::new(KeyPair::from_secret_hex(hex)?),
        None => {
            info!("No signing key configured, using an ephemeral engine key");
            RecordSigner::ephemeral()
        }
    };
    let gatekeeper = Gatekeeper::new(config.validation()?);

    let store = Arc::new(SqliteStore::with_gatekeeper(
        &config.database_path,
        gatekeeper.clone(),
        signer.clone(),
    )?);

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        LensRegistry::with_default_lenses(),
        signer.clone(),
        config.consensus.clone(),
    ));

    let ingestor = Arc::new(SignalIngestor::new(
        Arc::clone(&store),
        gatekeeper,
        signer,
        config.ingestor.clone(),
    ));
    let (ingest, _worker) = IngestWorker::spawn(ingestor);

    let session_manager = Arc::new(SessionManager::new(&config.jwt_secret, config.token_expiry_secs));

    Ok(AppState {
        store,
        orchestrator,
        ingest,
        session_manager,
        admin_secret: Arc::from(config.admin_secret.as_str()),
    })
}

/// Start the Router HTTP server
///
/// Builds application state from the configuration and serves until
/// ctrl-c.
pub async fn start_server(config: RouterConfig) -> Result<(), RouterError> {
    // Ignore the error when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    info!("Starting Verity Router");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!("Token expiry: {} seconds", config.token_expiry_secs);
    info!("Validation preset: {}", config.validation_preset);

    let state = build_state(&config)?;
    info!("Engine key: {}", state.store.signer().public_hex());
    info!("Registered lenses: {}", state.orchestrator.registry().len());

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Router listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RouterError::Server(e.to_string()))?;

    info!("Router stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
