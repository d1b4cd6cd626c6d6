use super::{Store, StoreError, StoreResult};
use crate::models::{
    empty_description, Asset, AssetKind, AssetUpdate, KeyType, Language, NewAsset, NewLanguage,
    NewTranslation, NewTranslationKey, Session, Translation, TranslationKey,
};
use crate::retry::{with_retry, RetryConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

const SCHEMA: &[(&str, &str)] = &[
    (
        "camfy_sessions",
        "CREATE TABLE IF NOT EXISTS camfy_sessions (
            session_id UUID PRIMARY KEY,
            created TIMESTAMPTZ NOT NULL,
            terminated TIMESTAMPTZ
        )",
    ),
    (
        "translation_keys",
        "CREATE TABLE IF NOT EXISTS translation_keys (
            id BIGSERIAL PRIMARY KEY,
            key TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL DEFAULT 'STRING'
        )",
    ),
    (
        "languages",
        "CREATE TABLE IF NOT EXISTS languages (
            id BIGSERIAL PRIMARY KEY,
            lan_code TEXT NOT NULL UNIQUE,
            lan_name TEXT NOT NULL,
            reg_code TEXT NOT NULL DEFAULT '',
            reg_name TEXT NOT NULL DEFAULT ''
        )",
    ),
    (
        "translations",
        "CREATE TABLE IF NOT EXISTS translations (
            id BIGSERIAL PRIMARY KEY,
            translation_key BIGINT NOT NULL REFERENCES translation_keys(id) ON DELETE CASCADE,
            language BIGINT NOT NULL REFERENCES languages(id) ON DELETE CASCADE,
            translation TEXT NOT NULL DEFAULT '',
            revision BIGINT NOT NULL DEFAULT 0
        )",
    ),
    (
        "camfy_models",
        "CREATE TABLE IF NOT EXISTS camfy_models (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            brief TEXT NOT NULL DEFAULT '',
            created TIMESTAMPTZ NOT NULL,
            updated TIMESTAMPTZ NOT NULL,
            desc_json TEXT NOT NULL DEFAULT '{}'
        )",
    ),
    (
        "camfy_environments",
        "CREATE TABLE IF NOT EXISTS camfy_environments (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            brief TEXT NOT NULL DEFAULT '',
            created TIMESTAMPTZ NOT NULL,
            updated TIMESTAMPTZ NOT NULL,
            desc_json TEXT NOT NULL DEFAULT '{}'
        )",
    ),
    (
        "camfy_touchpoints",
        "CREATE TABLE IF NOT EXISTS camfy_touchpoints (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            brief TEXT NOT NULL DEFAULT '',
            created TIMESTAMPTZ NOT NULL,
            updated TIMESTAMPTZ NOT NULL,
            desc_json TEXT NOT NULL DEFAULT '{}'
        )",
    ),
];

/// PostgreSQL-backed datastore
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect (with retries) and create the tables if they do not exist yet
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = with_retry(
            &RetryConfig::database_connect(),
            "Connect to PostgreSQL",
            || {
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(database_url)
            },
        )
        .await
        .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    pub async fn create_tables(&self) -> Result<()> {
        for (table, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create {} table", table))?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

// ==================== Row Mapping ====================

fn session_from_row(row: &PgRow) -> Result<Session, sqlx::Error> {
    Ok(Session {
        session_id: row.try_get("session_id")?,
        created: row.try_get("created")?,
        terminated: row.try_get("terminated")?,
    })
}

fn key_from_row(row: &PgRow) -> Result<TranslationKey, sqlx::Error> {
    let key_type: String = row.try_get("type")?;
    Ok(TranslationKey {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        key_type: key_type
            .parse::<KeyType>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?,
    })
}

fn language_from_row(row: &PgRow) -> Result<Language, sqlx::Error> {
    Ok(Language {
        id: row.try_get("id")?,
        lan_code: row.try_get("lan_code")?,
        lan_name: row.try_get("lan_name")?,
        reg_code: row.try_get("reg_code")?,
        reg_name: row.try_get("reg_name")?,
    })
}

fn translation_from_row(row: &PgRow) -> Result<Translation, sqlx::Error> {
    Ok(Translation {
        id: row.try_get("id")?,
        translation_key: row.try_get("translation_key")?,
        language: row.try_get("language")?,
        translation: row.try_get("translation")?,
        revision: row.try_get("revision")?,
    })
}

fn asset_from_row(row: &PgRow) -> Result<Asset, sqlx::Error> {
    let desc_json: String = row.try_get("desc_json")?;
    Ok(Asset {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        brief: row.try_get("brief")?,
        created: row.try_get("created")?,
        updated: row.try_get("updated")?,
        desc_json: serde_json::from_str(&desc_json).map_err(|e| sqlx::Error::Decode(e.into()))?,
    })
}

/// Translate constraint violations into the store's client-facing errors
fn classify(err: sqlx::Error, conflict: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(conflict());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::InvalidReference(
                "Referenced translation key or language does not exist".to_string(),
            );
        }
    }
    StoreError::Database(err)
}

const KEY_COLUMNS: &str = "id, key, type";
const LANGUAGE_COLUMNS: &str = "id, lan_code, lan_name, reg_code, reg_name";
const TRANSLATION_COLUMNS: &str = "id, translation_key, language, translation, revision";
const ASSET_COLUMNS: &str = "id, name, brief, created, updated, desc_json";

#[async_trait]
impl Store for PgStore {
    async fn create_session(&self) -> StoreResult<Session> {
        let session = Session::new();
        sqlx::query("INSERT INTO camfy_sessions (session_id, created, terminated) VALUES ($1, $2, NULL)")
            .bind(session.session_id)
            .bind(session.created)
            .execute(&self.pool)
            .await?;
        Ok(session)
    }

    async fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let rows = sqlx::query(
            "SELECT session_id, created, terminated FROM camfy_sessions ORDER BY created DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(session_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_session(&self, session_id: Uuid) -> StoreResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT session_id, created, terminated FROM camfy_sessions WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(session_from_row).transpose()?)
    }

    async fn terminate_session(&self, session_id: Uuid) -> StoreResult<Option<Session>> {
        let row = sqlx::query(
            "UPDATE camfy_sessions SET terminated = $1 WHERE session_id = $2
             RETURNING session_id, created, terminated",
        )
        .bind(Utc::now())
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(session_from_row).transpose()?)
    }

    async fn list_keys(&self) -> StoreResult<Vec<TranslationKey>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM translation_keys ORDER BY id",
            KEY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(key_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_key(&self, id: i64) -> StoreResult<Option<TranslationKey>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM translation_keys WHERE id = $1",
            KEY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(key_from_row).transpose()?)
    }

    async fn create_key(&self, new: NewTranslationKey) -> StoreResult<TranslationKey> {
        let row = sqlx::query(&format!(
            "INSERT INTO translation_keys (key, type) VALUES ($1, $2) RETURNING {}",
            KEY_COLUMNS
        ))
        .bind(&new.key)
        .bind(new.key_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("Translation key '{}' already exists", new.key)))?;
        Ok(key_from_row(&row)?)
    }

    async fn update_key(
        &self,
        id: i64,
        update: NewTranslationKey,
    ) -> StoreResult<Option<TranslationKey>> {
        let row = sqlx::query(&format!(
            "UPDATE translation_keys SET key = $1, type = $2 WHERE id = $3 RETURNING {}",
            KEY_COLUMNS
        ))
        .bind(&update.key)
        .bind(update.key_type.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("Translation key '{}' already exists", update.key)))?;
        Ok(row.as_ref().map(key_from_row).transpose()?)
    }

    async fn delete_key(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM translation_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_languages(&self) -> StoreResult<Vec<Language>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM languages ORDER BY id",
            LANGUAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(language_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_language(&self, id: i64) -> StoreResult<Option<Language>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM languages WHERE id = $1",
            LANGUAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(language_from_row).transpose()?)
    }

    async fn create_language(&self, new: NewLanguage) -> StoreResult<Language> {
        let row = sqlx::query(&format!(
            "INSERT INTO languages (lan_code, lan_name, reg_code, reg_name)
             VALUES ($1, $2, $3, $4) RETURNING {}",
            LANGUAGE_COLUMNS
        ))
        .bind(&new.lan_code)
        .bind(&new.lan_name)
        .bind(&new.reg_code)
        .bind(&new.reg_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("Language '{}' already exists", new.lan_code)))?;
        Ok(language_from_row(&row)?)
    }

    async fn update_language(
        &self,
        id: i64,
        update: NewLanguage,
    ) -> StoreResult<Option<Language>> {
        let row = sqlx::query(&format!(
            "UPDATE languages SET lan_code = $1, lan_name = $2, reg_code = $3, reg_name = $4
             WHERE id = $5 RETURNING {}",
            LANGUAGE_COLUMNS
        ))
        .bind(&update.lan_code)
        .bind(&update.lan_name)
        .bind(&update.reg_code)
        .bind(&update.reg_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("Language '{}' already exists", update.lan_code)))?;
        Ok(row.as_ref().map(language_from_row).transpose()?)
    }

    async fn delete_language(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM languages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_translations(&self) -> StoreResult<Vec<Translation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM translations ORDER BY id",
            TRANSLATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(translation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn translations_for_language(&self, language_id: i64) -> StoreResult<Vec<Translation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM translations WHERE language = $1 ORDER BY id",
            TRANSLATION_COLUMNS
        ))
        .bind(language_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(translation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_translation(&self, id: i64) -> StoreResult<Option<Translation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM translations WHERE id = $1",
            TRANSLATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(translation_from_row).transpose()?)
    }

    async fn create_translation(&self, new: NewTranslation) -> StoreResult<Translation> {
        let row = sqlx::query(&format!(
            "INSERT INTO translations (translation_key, language, translation, revision)
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TRANSLATION_COLUMNS
        ))
        .bind(new.translation_key)
        .bind(new.language)
        .bind(&new.translation)
        .bind(new.revision)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || "Translation already exists".to_string()))?;
        Ok(translation_from_row(&row)?)
    }

    async fn update_translation(
        &self,
        id: i64,
        update: NewTranslation,
    ) -> StoreResult<Option<Translation>> {
        let row = sqlx::query(&format!(
            "UPDATE translations SET translation_key = $1, language = $2, translation = $3, revision = $4
             WHERE id = $5 RETURNING {}",
            TRANSLATION_COLUMNS
        ))
        .bind(update.translation_key)
        .bind(update.language)
        .bind(&update.translation)
        .bind(update.revision)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, || "Translation already exists".to_string()))?;
        Ok(row.as_ref().map(translation_from_row).transpose()?)
    }

    async fn delete_translation(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM translations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_assets(&self, kind: AssetKind) -> StoreResult<Vec<Asset>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM {} ORDER BY id",
            ASSET_COLUMNS,
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(asset_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_asset(&self, kind: AssetKind, id: i64) -> StoreResult<Option<Asset>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            ASSET_COLUMNS,
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(asset_from_row).transpose()?)
    }

    async fn create_asset(&self, kind: AssetKind, new: NewAsset) -> StoreResult<Asset> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO {} (name, brief, created, updated, desc_json)
             VALUES ($1, $2, $3, $3, $4) RETURNING {}",
            kind.table(),
            ASSET_COLUMNS
        ))
        .bind(&new.name)
        .bind(&new.brief)
        .bind(now)
        .bind(empty_description().to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("{} with name '{}' already exists", kind, new.name)))?;
        Ok(asset_from_row(&row)?)
    }

    async fn update_asset(
        &self,
        kind: AssetKind,
        id: i64,
        update: AssetUpdate,
    ) -> StoreResult<Option<Asset>> {
        let row = sqlx::query(&format!(
            "UPDATE {} SET desc_json = COALESCE($1, desc_json), updated = $2
             WHERE id = $3 RETURNING {}",
            kind.table(),
            ASSET_COLUMNS
        ))
        .bind(update.desc_json.map(|value| value.to_string()))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(asset_from_row).transpose()?)
    }

    async fn delete_asset(&self, kind: AssetKind, id: i64) -> StoreResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
