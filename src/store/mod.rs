//! Datastore access.
//!
//! Handlers and the localization core never talk to a database directly;
//! they go through the [`Store`] trait. Two implementations exist:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, used in production
//! - [`MemoryStore`]: in-process tables, used for local development and tests
//!
//! Reads are plain queries without a surrounding transaction, so a request
//! running next to concurrent writes may observe a partially updated set of
//! translations.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{
    Asset, AssetKind, AssetUpdate, Language, NewAsset, NewLanguage, NewTranslation,
    NewTranslationKey, Session, Translation, TranslationKey,
};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column already holds this value
    #[error("{0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist
    #[error("{0}")]
    InvalidReference(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the API.
///
/// List operations return rows ordered by id, except sessions which are
/// returned newest first. `update_*` and `terminate_session` return `None`
/// and `delete_*` return `false` when the row does not exist.
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Sessions ====================

    async fn create_session(&self) -> StoreResult<Session>;
    async fn list_sessions(&self) -> StoreResult<Vec<Session>>;
    async fn get_session(&self, session_id: Uuid) -> StoreResult<Option<Session>>;
    /// Stamp the termination time. Terminating twice refreshes the timestamp.
    async fn terminate_session(&self, session_id: Uuid) -> StoreResult<Option<Session>>;

    // ==================== Translation keys ====================

    async fn list_keys(&self) -> StoreResult<Vec<TranslationKey>>;
    async fn get_key(&self, id: i64) -> StoreResult<Option<TranslationKey>>;
    async fn create_key(&self, new: NewTranslationKey) -> StoreResult<TranslationKey>;
    async fn update_key(
        &self,
        id: i64,
        update: NewTranslationKey,
    ) -> StoreResult<Option<TranslationKey>>;
    /// Deleting a key cascades to its translations
    async fn delete_key(&self, id: i64) -> StoreResult<bool>;

    // ==================== Languages ====================

    async fn list_languages(&self) -> StoreResult<Vec<Language>>;
    async fn get_language(&self, id: i64) -> StoreResult<Option<Language>>;
    async fn create_language(&self, new: NewLanguage) -> StoreResult<Language>;
    async fn update_language(&self, id: i64, update: NewLanguage)
        -> StoreResult<Option<Language>>;
    /// Deleting a language cascades to its translations
    async fn delete_language(&self, id: i64) -> StoreResult<bool>;

    // ==================== Translations ====================

    async fn list_translations(&self) -> StoreResult<Vec<Translation>>;
    async fn translations_for_language(&self, language_id: i64) -> StoreResult<Vec<Translation>>;
    async fn get_translation(&self, id: i64) -> StoreResult<Option<Translation>>;
    async fn create_translation(&self, new: NewTranslation) -> StoreResult<Translation>;
    async fn update_translation(
        &self,
        id: i64,
        update: NewTranslation,
    ) -> StoreResult<Option<Translation>>;
    async fn delete_translation(&self, id: i64) -> StoreResult<bool>;

    // ==================== Models, environments, touchpoints ====================

    async fn list_assets(&self, kind: AssetKind) -> StoreResult<Vec<Asset>>;
    async fn get_asset(&self, kind: AssetKind, id: i64) -> StoreResult<Option<Asset>>;
    /// Names are unique per kind
    async fn create_asset(&self, kind: AssetKind, new: NewAsset) -> StoreResult<Asset>;
    /// Replace the description (when given) and bump `updated`
    async fn update_asset(
        &self,
        kind: AssetKind,
        id: i64,
        update: AssetUpdate,
    ) -> StoreResult<Option<Asset>>;
    async fn delete_asset(&self, kind: AssetKind, id: i64) -> StoreResult<bool>;
}
