use super::{ApiPath, AppState};
use crate::error::ApiError;
use crate::sessions::{
    elapsed_seconds, is_terminated, join_cookies, launch_session, LaunchTarget, SessionResponse,
};
use axum::{
    extract::{ConnectInfo, State},
    http::{header::SET_COOKIE, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tracing::info;
use uuid::Uuid;

/// GET /sessions
pub(super) async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let sessions = state.store.list_sessions().await?;
    Ok(Json(sessions.iter().map(SessionResponse::from).collect()))
}

/// POST /sessions - create and launch a session
pub(super) async fn create_session(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state.store.create_session().await?;
    info!("Created session {}", session.session_id);

    let target = LaunchTarget::for_client(peer.map(|ConnectInfo(addr)| addr.ip()));
    launch_session(&session, target);

    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// GET /sessions/:id
pub(super) async fn get_session(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .store
        .get_session(session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", session_id)))?;
    Ok(Json(SessionResponse::from(&session)))
}

/// DELETE /sessions/:id - terminate the session (the row is kept)
pub(super) async fn terminate_session(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .store
        .terminate_session(session_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("Session {} does not exist", session_id)))?;
    info!("Terminated session {}", session_id);
    Ok(Json(SessionResponse::from(&session)))
}

/// GET /sessions/:id/elapsed - an unknown session has run for 0 seconds
pub(super) async fn session_elapsed(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let elapsed = elapsed_seconds(state.store.as_ref(), session_id).await?;
    Ok(Json(json!({
        "session_id": session_id,
        "elapsed_seconds": elapsed,
    })))
}

/// GET /sessions/:id/join - hand out broker cookies for an active session
pub(super) async fn join_session(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if is_terminated(state.store.as_ref(), session_id).await? {
        return Err(ApiError::NotFound(format!(
            "Session {} is not active",
            session_id
        )));
    }

    // The session may have vanished between the two reads
    let session = state
        .store
        .get_session(session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", session_id)))?;

    let cookies: Vec<(HeaderName, String)> = join_cookies(&state.config, &session)
        .into_iter()
        .map(|(name, value)| (SET_COOKIE, format!("{}={}; Path=/", name, value)))
        .collect();

    info!("Client joining session {}", session_id);
    Ok((StatusCode::OK, AppendHeaders(cookies)))
}
