use super::AppState;
use crate::error::ApiError;
use crate::security::{bearer_token, constant_time_compare, has_api_key};
use crate::sessions::is_terminated;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

/// Proof that the request was made by a localizer.
///
/// Handlers that take this extractor are refused with 401 unless the request
/// carries `Authorization: Bearer <LOCALIZER_API_KEY>`.
#[derive(Debug, Clone, Copy)]
pub struct Localizer;

#[async_trait]
impl FromRequestParts<AppState> for Localizer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if has_api_key(state.config.localizer_api_key.as_deref(), &parts.headers) {
            Ok(Localizer)
        } else {
            warn!("Rejected localizer request to {}", parts.uri.path());
            Err(ApiError::Unauthorized)
        }
    }
}

/// Proof that the request comes from the Camerafy editor or from a client of
/// an active session.
///
/// Accepted bearer tokens are `EDITOR_API_KEY` and the id of a session that
/// has not been terminated.
#[derive(Debug, Clone, Copy)]
pub struct Editor;

#[async_trait]
impl FromRequestParts<AppState> for Editor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(&parts.headers) {
            if let Some(expected) = state.config.editor_api_key.as_deref() {
                if constant_time_compare(expected, token) {
                    return Ok(Editor);
                }
            }
            if let Ok(session_id) = token.parse::<Uuid>() {
                if !is_terminated(state.store.as_ref(), session_id).await? {
                    return Ok(Editor);
                }
            }
        }

        warn!("Rejected editor request to {}", parts.uri.path());
        Err(ApiError::Unauthorized)
    }
}
