use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use eai_core::LearnerProfile;
use eai_core::events::KernelEvent;
use eai_runtime::{ChatMessage, Dashboard, TurnOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::parse_locale;
use crate::state::{AppState, SessionEntry};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{id}", get(get_session).delete(delete_session))
        .route("/v1/sessions/{id}/transcript", get(get_transcript))
        .route("/v1/sessions/{id}/events", get(get_events))
        .route("/v1/sessions/{id}/start", post(start_session))
        .route("/v1/sessions/{id}/turns", post(send_turn))
        .route("/v1/sessions/{id}/reset", post(reset_session))
        .route("/v1/sessions/{id}/locale", put(switch_locale))
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Catalog and conversation language (defaults to the server locale)
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub dashboard: Dashboard,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub profile: LearnerProfile,
    pub goal: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendTurnRequest {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchLocaleRequest {
    pub locale: String,
}

fn lookup(state: &AppState, id: Uuid) -> Result<SessionEntry, AppError> {
    state.sessions.get(id).ok_or_else(|| AppError::NotFound {
        resource: "session",
        id: id.to_string(),
    })
}

/// Open a new coaching session
#[utoipa::path(
    post,
    path = "/v1/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = CreateSessionResponse),
        (status = 400, description = "Unsupported locale", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let locale = match req.locale.as_deref() {
        Some(raw) => parse_locale("locale", raw)?,
        None => state.default_locale,
    };
    let entry = state.open_session(locale);
    let response = CreateSessionResponse {
        session_id: entry.session.id(),
        dashboard: entry.session.dashboard(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Dashboard read model of a session
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current dashboard", body = Dashboard),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(lookup(&state, id)?.session.dashboard()))
}

/// Close a session and release its transcript and conversation context
#[utoipa::path(
    delete,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError),
        (status = 409, description = "Session busy", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let entry = lookup(&state, id)?;
    if entry.session.is_busy() {
        return Err(AppError::SessionBusy);
    }
    state.sessions.remove(id);
    tracing::info!(session_id = %id, open_sessions = state.sessions.len(), "session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Chat transcript of a session, oldest first
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/transcript",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Transcript", body = Vec<ChatMessage>),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    Ok(Json(lookup(&state, id)?.session.transcript()))
}

/// Diagnostic events the session has recorded
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/events",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Recorded events, oldest first", body = Vec<KernelEvent>),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn get_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<KernelEvent>>, AppError> {
    Ok(Json(lookup(&state, id)?.events.snapshot()))
}

/// Start the conversation from a learner profile and a goal
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/start",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "First collaborator turn", body = TurnOutcome),
        (status = 400, description = "Empty goal", body = eai_core::error::ApiError),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError),
        (status = 409, description = "Session busy", body = eai_core::error::ApiError),
        (status = 502, description = "Collaborator failed", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    let entry = lookup(&state, id)?;
    let outcome = entry.session.start(&req.profile, &req.goal).await?;
    Ok(Json(outcome))
}

/// Send one learner message
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/turns",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SendTurnRequest,
    responses(
        (status = 200, description = "Collaborator turn with validation and new state", body = TurnOutcome),
        (status = 400, description = "Empty message", body = eai_core::error::ApiError),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError),
        (status = 409, description = "Session busy", body = eai_core::error::ApiError),
        (status = 502, description = "Collaborator failed", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn send_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendTurnRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    let entry = lookup(&state, id)?;
    let outcome = entry.session.send(&req.message).await?;
    Ok(Json(outcome))
}

/// Reset a session to its initial state
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/reset",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Dashboard after reset", body = Dashboard),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError),
        (status = 409, description = "Session busy", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Dashboard>, AppError> {
    let entry = lookup(&state, id)?;
    entry.session.reset()?;
    Ok(Json(entry.session.dashboard()))
}

/// Switch the session's catalog and conversation language
#[utoipa::path(
    put,
    path = "/v1/sessions/{id}/locale",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SwitchLocaleRequest,
    responses(
        (status = 200, description = "Dashboard in the new locale", body = Dashboard),
        (status = 400, description = "Unsupported locale", body = eai_core::error::ApiError),
        (status = 404, description = "Unknown session", body = eai_core::error::ApiError),
        (status = 409, description = "Session busy", body = eai_core::error::ApiError)
    ),
    tag = "sessions"
)]
pub async fn switch_locale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SwitchLocaleRequest>,
) -> Result<Json<Dashboard>, AppError> {
    let locale = parse_locale("locale", &req.locale)?;
    let entry = lookup(&state, id)?;
    entry.session.switch_locale(locale)?;
    Ok(Json(entry.session.dashboard()))
}
