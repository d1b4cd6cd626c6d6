//! HTTP API.
//!
//! ## Endpoints
//! - `GET|POST /sessions`, `GET|DELETE /sessions/:id`, `GET /sessions/:id/join`,
//!   `GET /sessions/:id/elapsed`
//! - `GET|POST /translationkeys`, `GET /translationkeys/progress`,
//!   `GET|PUT|DELETE /translationkeys/:id`
//! - `GET|POST /languages`, `GET /languages/progress`, `GET|PUT|DELETE /languages/:id`
//! - `GET|POST /translations`, `GET|PUT|DELETE /translations/:id`
//! - `GET|POST /{models,environments,touchpoints}`,
//!   `GET|PUT|DELETE /{models,environments,touchpoints}/:id`
//! - `GET /health`
//!
//! Localizer-only handlers take the [`Localizer`] extractor, 3D content
//! handlers the [`Editor`] extractor. Bodies, query strings and path
//! parameters go through the extractors in [`extract`] so that malformed
//! input is answered with a JSON 400.

mod assets;
mod auth;
pub mod extract;
mod localization;
mod sessions;

pub use auth::{Editor, Localizer};
pub use extract::{ApiJson, ApiPath, ApiQuery};

use crate::config::Config;
use crate::models::AssetKind;
use crate::store::Store;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let app: Router<AppState> = Router::new()
        .route("/health", get(health))
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::terminate_session),
        )
        .route("/sessions/:id/join", get(sessions::join_session))
        .route("/sessions/:id/elapsed", get(sessions::session_elapsed))
        .route(
            "/translationkeys",
            get(localization::list_keys).post(localization::create_key),
        )
        .route("/translationkeys/progress", get(localization::key_progress))
        .route(
            "/translationkeys/:id",
            get(localization::get_key)
                .put(localization::update_key)
                .delete(localization::delete_key),
        )
        .route(
            "/languages",
            get(localization::list_languages).post(localization::create_language),
        )
        .route("/languages/progress", get(localization::language_progress))
        .route(
            "/languages/:id",
            get(localization::get_language)
                .put(localization::update_language)
                .delete(localization::delete_language),
        )
        .route(
            "/translations",
            get(localization::query_translations).post(localization::create_translation),
        )
        .route(
            "/translations/:id",
            get(localization::get_translation)
                .put(localization::update_translation)
                .delete(localization::delete_translation),
        );

    AssetKind::ALL
        .into_iter()
        .fold(app, assets::register)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
