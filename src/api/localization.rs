use super::{ApiJson, ApiPath, ApiQuery, AppState, Localizer};
use crate::error::ApiError;
use crate::localization::{
    self, parse_language_codes, validate_key, validate_language_code, Progress, QueryResponse,
    Shape,
};
use crate::models::{
    Language, NewLanguage, NewTranslation, NewTranslationKey, Translation, TranslationKey,
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

/// Query string of `GET /translations`
#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct TranslationQuery {
    /// Comma-separated language codes
    #[serde(alias = "languages")]
    language: Option<String>,
    flat: Option<String>,
}

/// Lenient boolean flag: `true/1/yes/on` (any case) are true, anything else false
fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

fn not_found(what: &str, id: i64) -> ApiError {
    ApiError::NotFound(format!("{} {} not found", what, id))
}

// ==================== Translation keys ====================

/// GET /translationkeys
pub(super) async fn list_keys(
    _: Localizer,
    State(state): State<AppState>,
) -> Result<Json<Vec<TranslationKey>>, ApiError> {
    Ok(Json(state.store.list_keys().await?))
}

/// POST /translationkeys
pub(super) async fn create_key(
    _: Localizer,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewTranslationKey>,
) -> Result<(StatusCode, Json<TranslationKey>), ApiError> {
    validate_key(&payload.key)?;
    let key = state.store.create_key(payload).await?;
    info!("Created translation key '{}' ({})", key.key, key.id);
    Ok((StatusCode::CREATED, Json(key)))
}

/// GET /translationkeys/:id
pub(super) async fn get_key(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<TranslationKey>, ApiError> {
    let key = state
        .store
        .get_key(id)
        .await?
        .ok_or_else(|| not_found("Translation key", id))?;
    Ok(Json(key))
}

/// PUT /translationkeys/:id
pub(super) async fn update_key(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NewTranslationKey>,
) -> Result<Json<TranslationKey>, ApiError> {
    validate_key(&payload.key)?;
    let key = state
        .store
        .update_key(id, payload)
        .await?
        .ok_or_else(|| not_found("Translation key", id))?;
    Ok(Json(key))
}

/// DELETE /translationkeys/:id - also deletes the key's translations
pub(super) async fn delete_key(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_key(id).await? {
        return Err(not_found("Translation key", id));
    }
    info!("Deleted translation key {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /translationkeys/progress
pub(super) async fn key_progress(
    _: Localizer,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Progress>>, ApiError> {
    let languages = state.store.list_languages().await?;
    let keys = state.store.list_keys().await?;
    let translations = state.store.list_translations().await?;
    Ok(Json(localization::key_progress(&keys, &languages, &translations)))
}

// ==================== Languages ====================

/// GET /languages (public)
pub(super) async fn list_languages(
    State(state): State<AppState>,
) -> Result<Json<Vec<Language>>, ApiError> {
    Ok(Json(state.store.list_languages().await?))
}

/// GET /languages/:id
pub(super) async fn get_language(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Language>, ApiError> {
    let language = state
        .store
        .get_language(id)
        .await?
        .ok_or_else(|| not_found("Language", id))?;
    Ok(Json(language))
}

/// POST /languages
pub(super) async fn create_language(
    _: Localizer,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewLanguage>,
) -> Result<(StatusCode, Json<Language>), ApiError> {
    validate_language_code(&payload.lan_code)?;
    let language = state.store.create_language(payload).await?;
    info!("Created language '{}' ({})", language.lan_code, language.id);
    Ok((StatusCode::CREATED, Json(language)))
}

/// PUT /languages/:id
pub(super) async fn update_language(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NewLanguage>,
) -> Result<Json<Language>, ApiError> {
    validate_language_code(&payload.lan_code)?;
    let language = state
        .store
        .update_language(id, payload)
        .await?
        .ok_or_else(|| not_found("Language", id))?;
    Ok(Json(language))
}

/// DELETE /languages/:id - also deletes the language's translations
pub(super) async fn delete_language(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_language(id).await? {
        return Err(not_found("Language", id));
    }
    info!("Deleted language {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /languages/progress
pub(super) async fn language_progress(
    _: Localizer,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Progress>>, ApiError> {
    let languages = state.store.list_languages().await?;
    let keys = state.store.list_keys().await?;
    let translations = state.store.list_translations().await?;
    Ok(Json(localization::language_progress(
        &keys,
        &languages,
        &translations,
    )))
}

// ==================== Translations ====================

/// GET /translations?language=de-DE,fr-FR&flat=true (public)
///
/// Without any language code the request fails with 404 and the list of
/// supported codes so the client can retry.
pub(super) async fn query_translations(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TranslationQuery>,
) -> Result<Json<QueryResponse>, ApiError> {
    let codes = parse_language_codes(query.language.as_deref().unwrap_or_default());
    if codes.is_empty() {
        let supported = state
            .store
            .list_languages()
            .await?
            .into_iter()
            .map(|language| language.lan_code)
            .collect();
        return Err(ApiError::MissingLanguage { supported });
    }

    let shape = Shape::from_flag(parse_flag(query.flat.as_deref()));
    let response = localization::query_translations(state.store.as_ref(), &codes, shape).await?;
    Ok(Json(response))
}

/// POST /translations
pub(super) async fn create_translation(
    _: Localizer,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewTranslation>,
) -> Result<(StatusCode, Json<Translation>), ApiError> {
    let translation = state.store.create_translation(payload).await?;
    info!(
        "Created translation {} (key {}, language {})",
        translation.id, translation.translation_key, translation.language
    );
    Ok((StatusCode::CREATED, Json(translation)))
}

/// GET /translations/:id
pub(super) async fn get_translation(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Translation>, ApiError> {
    let translation = state
        .store
        .get_translation(id)
        .await?
        .ok_or_else(|| not_found("Translation", id))?;
    Ok(Json(translation))
}

/// PUT /translations/:id - `revision` is stored as sent
pub(super) async fn update_translation(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NewTranslation>,
) -> Result<Json<Translation>, ApiError> {
    let translation = state
        .store
        .update_translation(id, payload)
        .await?
        .ok_or_else(|| not_found("Translation", id))?;
    Ok(Json(translation))
}

/// DELETE /translations/:id
pub(super) async fn delete_translation(
    _: Localizer,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_translation(id).await? {
        return Err(not_found("Translation", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
