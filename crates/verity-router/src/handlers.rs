//! HTTP request handlers.
//!
//! Every failure is answered with `{"error": <message>, "kind": <code>}`
//! and a status derived from the error kind.

use crate::session::{Role, SessionError, SessionManager, SessionResponse};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router as AxumRouter,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, warn};
use verity_consensus::{ConsensusError, DisputedClaim, LensDescriptor, LensParams, Orchestrator};
use verity_domain::traits::{ClaimQuery, LedgerStore, ProvenanceStore};
use verity_domain::{
    Attribution, Claim, ClaimId, ConfidenceReport, Counterclaim, ErrorKind, Evidence, Fault, Method, ObjectKind,
    PlayfulSignal, ReadOptions, TransparencyRecord,
};
use verity_ingestor::{IngestError, IngestHandle, IngestOutcome};
use verity_store::{SqliteStore, StoreError};

const DEFAULT_DISPUTED_LIMIT: usize = 50;
const DEFAULT_RECORD_LIMIT: usize = 100;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Provenance store and ledger
    pub store: Arc<SqliteStore>,
    /// Lens runner
    pub orchestrator: Arc<Orchestrator<SqliteStore>>,
    /// Queue in front of the signal ingestor
    pub ingest: IngestHandle,
    /// Session manager for JWT token operations
    pub session_manager: Arc<SessionManager>,
    /// Secret that grants the admin role
    pub admin_secret: Arc<str>,
}

/// Session establishment request
#[derive(Debug, Default, Deserialize)]
pub struct EstablishSessionRequest {
    /// Caller identifier
    #[serde(default)]
    pub user_id: Option<String>,

    /// Admin secret; grants the admin role when it matches
    #[serde(default)]
    pub admin_secret: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Number of registered lenses
    pub lens_count: usize,
    /// Public key transparency records are signed with
    pub engine_key: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Stable error code
    pub kind: String,
}

/// Application error type
#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    /// Build an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    fn from_fault<E: Fault + Display>(err: &E) -> Self {
        Self::new(err.kind(), err.to_string())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::InvalidSignature | ErrorKind::Validation | ErrorKind::WeightCapExceeded => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound | ErrorKind::LensNotFound => StatusCode::NOT_FOUND,
            ErrorKind::LensUnavailable | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::LineageCycle | ErrorKind::UnknownParent | ErrorKind::QuorumUnmet => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(kind = %self.kind, error = %self.message, "Request failed");
        } else {
            debug!(kind = %self.kind, error = %self.message, "Request refused");
        }

        let body = Json(ErrorResponse {
            error: self.message,
            kind: self.kind.as_str().to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::from_fault(&e)
    }
}

impl From<ConsensusError> for AppError {
    fn from(e: ConsensusError) -> Self {
        AppError::from_fault(&e)
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        AppError::from_fault(&e)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let kind = match e {
            SessionError::JwtEncode(_) => ErrorKind::Storage,
            SessionError::TokenExpired | SessionError::InvalidToken | SessionError::Unauthorized(_) => {
                ErrorKind::Unauthorized
            }
        };
        AppError::new(kind, e.to_string())
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::validation(format!("malformed request body: {}", e)))
}

fn parse_claim_id(raw: &str) -> Result<ClaimId, AppError> {
    ClaimId::from_string(raw).map_err(AppError::validation)
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<crate::session::SessionClaims, AppError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    Ok(state.session_manager.require_admin(authorization)?)
}

fn check_owner(path_id: ClaimId, body_id: ClaimId) -> Result<(), AppError> {
    if path_id != body_id {
        return Err(AppError::validation(format!(
            "claim_id {} in body does not match claim {} in path",
            body_id, path_id
        )));
    }
    Ok(())
}

/// Query for single-claim reads
#[derive(Debug, Default, Deserialize)]
pub struct ClaimReadQuery {
    /// Return the claim even when soft-deleted (admin only)
    #[serde(default)]
    pub include_deleted: bool,
}

/// Query for claim listings
#[derive(Debug, Default, Deserialize)]
pub struct ClaimListQuery {
    /// Topic tag filter
    pub topic: Option<String>,
    /// Substring filter on title or statement
    pub text: Option<String>,
    /// Maximum results
    pub limit: Option<usize>,
}

/// Query for `POST /consensus/run`
#[derive(Debug, Deserialize)]
pub struct RunQuery {
    /// Claim to evaluate
    #[serde(rename = "claimId")]
    pub claim_id: Option<String>,
    /// Lens to run
    #[serde(rename = "lensId")]
    pub lens_id: Option<String>,
}

/// Query for report history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Lens whose history to list
    #[serde(rename = "lensId")]
    pub lens_id: Option<String>,
}

/// Query for disputed claims
#[derive(Debug, Default, Deserialize)]
pub struct DisputedQuery {
    /// Best-score threshold
    pub threshold: Option<f64>,
    /// Maximum results
    pub limit: Option<usize>,
}

/// Query for transparency records
#[derive(Debug, Deserialize)]
pub struct TransparencyQuery {
    /// Object id the records concern
    pub subject: Option<String>,
    /// Maximum results
    pub limit: Option<usize>,
}

/// Response to a deletion
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Object kind
    pub kind: String,
    /// Object id
    pub id: String,
    /// False when the object was already deleted
    pub deleted: bool,
}

/// POST /claims
async fn create_claim(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<Claim>), AppError> {
    let claim: Claim = parse_body(&body)?;
    let stored = state.store.put_claim(claim)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /claims
async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<ClaimListQuery>,
) -> Result<Json<Vec<Claim>>, AppError> {
    let claims = state.store.query_claims(&ClaimQuery {
        topic: query.topic,
        text: query.text,
        include_deleted: false,
        heads_only: false,
        limit: query.limit,
    })?;
    Ok(Json(claims))
}

/// GET /claims/:id
async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ClaimReadQuery>,
    headers: HeaderMap,
) -> Result<Json<Claim>, AppError> {
    let claim_id = parse_claim_id(&id)?;
    let opts = if query.include_deleted {
        require_admin(&state, &headers)?;
        ReadOptions::audit()
    } else {
        ReadOptions::live()
    };

    state
        .store
        .get_claim(claim_id, opts)?
        .map(Json)
        .ok_or_else(|| AppError::new(ErrorKind::NotFound, format!("claim {} not found", claim_id)))
}

/// GET /claims/:id/lineage
async fn get_lineage(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Vec<Claim>>, AppError> {
    let claim_id = parse_claim_id(&id)?;
    Ok(Json(state.store.get_lineage(claim_id)?))
}

/// GET /claims/:id/current
async fn get_current_version(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Claim>, AppError> {
    let claim_id = parse_claim_id(&id)?;
    Ok(Json(state.store.current_version(claim_id)?))
}

/// POST /claims/:id/evidence
async fn add_evidence(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Evidence>), AppError> {
    let claim_id = parse_claim_id(&id)?;
    let evidence: Evidence = parse_body(&body)?;
    check_owner(claim_id, evidence.claim_id)?;
    Ok((StatusCode::CREATED, Json(state.store.put_evidence(evidence)?)))
}

/// GET /claims/:id/evidence
async fn list_evidence(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Vec<Evidence>>, AppError> {
    let claim_id = parse_claim_id(&id)?;
    Ok(Json(state.store.get_evidence_for_claim(claim_id, ReadOptions::live())?))
}

/// POST /claims/:id/counterclaims
async fn add_counterclaim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Counterclaim>), AppError> {
    let claim_id = parse_claim_id(&id)?;
    let counterclaim: Counterclaim = parse_body(&body)?;
    check_owner(claim_id, counterclaim.claim_id)?;
    Ok((StatusCode::CREATED, Json(state.store.put_counterclaim(counterclaim)?)))
}

/// GET /claims/:id/counterclaims
async fn list_counterclaims(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Counterclaim>>, AppError> {
    let claim_id = parse_claim_id(&id)?;
    Ok(Json(state.store.get_counterclaims_for_claim(claim_id, ReadOptions::live())?))
}

/// POST /claims/:id/methods
async fn add_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Method>), AppError> {
    let claim_id = parse_claim_id(&id)?;
    let method: Method = parse_body(&body)?;
    check_owner(claim_id, method.claim_id)?;
    Ok((StatusCode::CREATED, Json(state.store.put_method(method)?)))
}

/// POST /claims/:id/attributions
async fn add_attribution(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Attribution>), AppError> {
    let claim_id = parse_claim_id(&id)?;
    let attribution: Attribution = parse_body(&body)?;
    check_owner(claim_id, attribution.claim_id)?;
    Ok((StatusCode::CREATED, Json(state.store.put_attribution(attribution)?)))
}

/// DELETE /admin/:kind/:id
async fn delete_object(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<DeleteResponse>, AppError> {
    let session = require_admin(&state, &headers)?;
    let object_kind =
        ObjectKind::parse(&kind).ok_or_else(|| AppError::validation(format!("unknown object kind '{}'", kind)))?;

    let deleted = state.store.mark_deleted(object_kind, &id, &session.user_id)?;
    Ok(Json(DeleteResponse { kind, id, deleted }))
}

/// POST /consensus/run?claimId&lensId
async fn run_consensus(
    State(state): State<AppState>,
    Query(query): Query<RunQuery>,
    body: Bytes,
) -> Result<Json<ConfidenceReport>, AppError> {
    let claim_id = parse_claim_id(
        query
            .claim_id
            .as_deref()
            .ok_or_else(|| AppError::validation("claimId is required"))?,
    )?;
    let lens_id = query.lens_id.ok_or_else(|| AppError::validation("lensId is required"))?;
    let params: LensParams = if body.is_empty() { LensParams::default() } else { parse_body(&body)? };

    let report = state.orchestrator.run_lens(claim_id, &lens_id, params).await?;
    Ok(Json(report))
}

/// GET /consensus/claim/:id/reports
async fn get_reports(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ConfidenceReport>>, AppError> {
    let claim_id = parse_claim_id(&id)?;
    Ok(Json(state.orchestrator.get_reports(claim_id).await?))
}

/// GET /consensus/claim/:id/history?lensId
async fn get_report_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ConfidenceReport>>, AppError> {
    let claim_id = parse_claim_id(&id)?;
    let lens_id = query.lens_id.ok_or_else(|| AppError::validation("lensId is required"))?;
    Ok(Json(state.orchestrator.report_history(claim_id, &lens_id).await?))
}

/// GET /consensus/lenses
async fn list_lenses(State(state): State<AppState>) -> Json<Vec<LensDescriptor>> {
    Json(state.orchestrator.lenses())
}

/// POST /truth/playful-signal
async fn submit_signal(State(state): State<AppState>, body: Bytes) -> Result<Json<IngestOutcome>, AppError> {
    let signal: PlayfulSignal = parse_body(&body)?;
    match state.ingest.submit(signal).await? {
        IngestOutcome::Rejected { reason, .. } => Err(reason.into()),
        accepted => Ok(Json(accepted)),
    }
}

/// GET /truth/disputed?threshold&limit
async fn get_disputed(
    State(state): State<AppState>,
    Query(query): Query<DisputedQuery>,
) -> Result<Json<Vec<DisputedClaim>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_DISPUTED_LIMIT);
    Ok(Json(state.orchestrator.disputed(query.threshold, limit).await?))
}

/// GET /transparency?subject&limit
async fn get_transparency(
    State(state): State<AppState>,
    Query(query): Query<TransparencyQuery>,
) -> Result<Json<Vec<TransparencyRecord>>, AppError> {
    let subject = query.subject.ok_or_else(|| AppError::validation("subject is required"))?;
    let limit = query.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    Ok(Json(state.store.records_for_subject(&subject, limit)?))
}

/// POST /session/establish
async fn establish_session(State(state): State<AppState>, body: Bytes) -> Result<Json<SessionResponse>, AppError> {
    let request: EstablishSessionRequest = if body.is_empty() {
        EstablishSessionRequest::default()
    } else {
        parse_body(&body)?
    };
    let user_id = request.user_id.unwrap_or_else(|| "anonymous".to_string());

    let role = match request.admin_secret {
        Some(secret) if secret.as_str() == &*state.admin_secret => Role::Admin,
        Some(_) => {
            warn!(user_id = %user_id, "Rejected admin session request");
            return Err(AppError::new(ErrorKind::Unauthorized, "admin secret mismatch"));
        }
        None => Role::Reader,
    };

    Ok(Json(state.session_manager.generate_token(&user_id, role)?))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: if state.ingest.is_closed() { "degraded" } else { "healthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        lens_count: state.orchestrator.registry().len(),
        engine_key: state.store.signer().public_hex(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/claims", post(create_claim).get(list_claims))
        .route("/claims/:id", get(get_claim))
        .route("/claims/:id/lineage", get(get_lineage))
        .route("/claims/:id/current", get(get_current_version))
        .route("/claims/:id/evidence", post(add_evidence).get(list_evidence))
        .route("/claims/:id/counterclaims", post(add_counterclaim).get(list_counterclaims))
        .route("/claims/:id/methods", post(add_method))
        .route("/claims/:id/attributions", post(add_attribution))
        .route("/admin/:kind/:id", delete(delete_object))
        .route("/consensus/run", post(run_consensus))
        .route("/consensus/claim/:id/reports", get(get_reports))
        .route("/consensus/claim/:id/history", get(get_report_history))
        .route("/consensus/lenses", get(list_lenses))
        .route("/truth/playful-signal", post(submit_signal))
        .route("/truth/disputed", get(get_disputed))
        .route("/transparency", get(get_transparency))
        .route("/session/establish", post(establish_session))
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ErrorKind::InvalidSignature, StatusCode::BAD_REQUEST),
            (ErrorKind::WeightCapExceeded, StatusCode::BAD_REQUEST),
            (ErrorKind::Unauthorized, StatusCode::UNAUTHORIZED),
            (ErrorKind::LensNotFound, StatusCode::NOT_FOUND),
            (ErrorKind::LensUnavailable, StatusCode::CONFLICT),
            (ErrorKind::Conflict, StatusCode::CONFLICT),
            (ErrorKind::LineageCycle, StatusCode::UNPROCESSABLE_ENTITY),
            (ErrorKind::QuorumUnmet, StatusCode::UNPROCESSABLE_ENTITY),
            (ErrorKind::Storage, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(AppError::new(kind, "x").status(), status, "{}", kind);
        }
    }

    #[test]
    fn test_session_errors_are_unauthorized() {
        let err = AppError::from(SessionError::InvalidToken);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
