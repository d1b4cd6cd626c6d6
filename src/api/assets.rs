//! Metadata of models, environments and touchpoints.
//!
//! The three collections behave the same and differ only in their table, so
//! one set of handlers is registered once per [`AssetKind`].

use super::{ApiJson, ApiPath, AppState, Editor};
use crate::error::ApiError;
use crate::models::{Asset, AssetKind, AssetUpdate, NewAsset};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::info;

/// Add `/{kind}` and `/{kind}/:id` to `router`
pub(super) fn register(router: Router<AppState>, kind: AssetKind) -> Router<AppState> {
    let collection = format!("/{}", kind.path());
    let item = format!("{}/:id", collection);

    router
        .route(
            &collection,
            get(move |_: Editor, State(state): State<AppState>| list_assets(state, kind)).post(
                move |_: Editor, State(state): State<AppState>, ApiJson(payload): ApiJson<NewAsset>| {
                    create_asset(state, kind, payload)
                },
            ),
        )
        .route(
            &item,
            get(
                move |_: Editor, State(state): State<AppState>, ApiPath(id): ApiPath<i64>| {
                    get_asset(state, kind, id)
                },
            )
            .put(
                move |_: Editor,
                      State(state): State<AppState>,
                      ApiPath(id): ApiPath<i64>,
                      ApiJson(payload): ApiJson<AssetUpdate>| {
                    update_asset(state, kind, id, payload)
                },
            )
            .delete(
                move |_: Editor, State(state): State<AppState>, ApiPath(id): ApiPath<i64>| {
                    delete_asset(state, kind, id)
                },
            ),
        )
}

fn not_found(kind: AssetKind, id: i64) -> ApiError {
    ApiError::NotFound(format!("{} {} not found", kind, id))
}

async fn list_assets(state: AppState, kind: AssetKind) -> Result<Json<Vec<Asset>>, ApiError> {
    Ok(Json(state.store.list_assets(kind).await?))
}

async fn get_asset(state: AppState, kind: AssetKind, id: i64) -> Result<Json<Asset>, ApiError> {
    let asset = state
        .store
        .get_asset(kind, id)
        .await?
        .ok_or_else(|| not_found(kind, id))?;
    Ok(Json(asset))
}

async fn create_asset(
    state: AppState,
    kind: AssetKind,
    payload: NewAsset,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required data field 'name'".to_string(),
        ));
    }
    let asset = state.store.create_asset(kind, payload).await?;
    info!("Created {} '{}' ({})", kind, asset.name, asset.id);
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Only `desc_json` is applied; other fields of the body are ignored
async fn update_asset(
    state: AppState,
    kind: AssetKind,
    id: i64,
    payload: AssetUpdate,
) -> Result<Json<Asset>, ApiError> {
    let asset = state
        .store
        .update_asset(kind, id, payload)
        .await?
        .ok_or_else(|| not_found(kind, id))?;
    Ok(Json(asset))
}

async fn delete_asset(state: AppState, kind: AssetKind, id: i64) -> Result<StatusCode, ApiError> {
    if !state.store.delete_asset(kind, id).await? {
        return Err(not_found(kind, id));
    }
    info!("Deleted {} {}", kind, id);
    Ok(StatusCode::NO_CONTENT)
}
