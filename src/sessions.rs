//! Session lifecycle: launching, elapsed time and joining.
//!
//! Sessions themselves are rows in the store; this module holds the rules
//! layered on top of them.

use crate::config::Config;
use crate::models::Session;
use crate::store::{Store, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::info;
use uuid::Uuid;

/// Where a freshly created session is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchTarget {
    /// The client runs on the same machine as the backend
    Local,
    Remote,
}

impl LaunchTarget {
    /// Loopback clients get a local session; unknown addresses count as remote
    pub fn for_client(addr: Option<IpAddr>) -> Self {
        match addr {
            Some(ip) if ip.to_canonical().is_loopback() => LaunchTarget::Local,
            _ => LaunchTarget::Remote,
        }
    }
}

/// Start the environment of a new session
pub fn launch_session(session: &Session, target: LaunchTarget) {
    match target {
        LaunchTarget::Local => info!(
            session_id = %session.session_id,
            "Launching local session (camfy.SessionId={})",
            session.session_id
        ),
        LaunchTarget::Remote => info!(session_id = %session.session_id, "Launching remote session"),
    }
}

/// Session as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created: DateTime<Utc>,
    pub terminated: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
}

impl SessionResponse {
    pub fn at(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session.session_id,
            created: session.created,
            terminated: session.terminated,
            elapsed_seconds: session.elapsed_seconds_at(now),
        }
    }
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self::at(session, Utc::now())
    }
}

/// Elapsed seconds of a session; a session that does not exist has run for 0 seconds
pub async fn elapsed_seconds(store: &dyn Store, session_id: Uuid) -> StoreResult<f64> {
    Ok(store
        .get_session(session_id)
        .await?
        .map(|session| session.elapsed_seconds_at(Utc::now()))
        .unwrap_or(0.0))
}

/// A session that does not exist counts as terminated
pub async fn is_terminated(store: &dyn Store, session_id: Uuid) -> StoreResult<bool> {
    Ok(store
        .get_session(session_id)
        .await?
        .map(|session| session.is_terminated())
        .unwrap_or(true))
}

/// Cookies handed to a client joining a session: broker endpoint, broker
/// credentials and the session id
pub fn join_cookies(config: &Config, session: &Session) -> Vec<(&'static str, String)> {
    vec![
        ("camfy_broker_url", config.broker_url.clone()),
        ("camfy_broker_usr", config.broker_user.clone()),
        ("camfy_broker_pwd", config.broker_password.clone()),
        ("camfy_session_id", session.session_id.to_string()),
    ]
}
