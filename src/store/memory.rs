use super::{Store, StoreError, StoreResult};
use crate::models::{
    empty_description, Asset, AssetKind, AssetUpdate, Language, NewAsset, NewLanguage,
    NewTranslation, NewTranslationKey, Session, Translation, TranslationKey,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    sessions: Vec<Session>,
    keys: Vec<TranslationKey>,
    languages: Vec<Language>,
    translations: Vec<Translation>,
    assets: HashMap<AssetKind, Vec<Asset>>,
    next_key_id: i64,
    next_language_id: i64,
    next_translation_id: i64,
    next_asset_id: HashMap<AssetKind, i64>,
}

impl Tables {
    fn check_key_unique(&self, key: &str, except: Option<i64>) -> StoreResult<()> {
        if self
            .keys
            .iter()
            .any(|k| k.key == key && Some(k.id) != except)
        {
            return Err(StoreError::Conflict(format!(
                "Translation key '{}' already exists",
                key
            )));
        }
        Ok(())
    }

    fn check_language_unique(&self, lan_code: &str, except: Option<i64>) -> StoreResult<()> {
        if self
            .languages
            .iter()
            .any(|l| l.lan_code == lan_code && Some(l.id) != except)
        {
            return Err(StoreError::Conflict(format!(
                "Language '{}' already exists",
                lan_code
            )));
        }
        Ok(())
    }

    fn check_references(&self, translation: &NewTranslation) -> StoreResult<()> {
        if !self.keys.iter().any(|k| k.id == translation.translation_key) {
            return Err(StoreError::InvalidReference(format!(
                "Translation key {} does not exist",
                translation.translation_key
            )));
        }
        if !self.languages.iter().any(|l| l.id == translation.language) {
            return Err(StoreError::InvalidReference(format!(
                "Language {} does not exist",
                translation.language
            )));
        }
        Ok(())
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// In-process datastore with the same semantics as the PostgreSQL schema
/// (unique keys and language codes, cascading deletes).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A panicking writer cannot leave the tables half-updated: every
        // mutation below is a single push, assignment or retain.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_session(&self) -> StoreResult<Session> {
        let session = Session::new();
        self.lock().sessions.push(session.clone());
        Ok(session)
    }

    async fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let mut sessions = self.lock().sessions.clone();
        sessions.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(sessions)
    }

    async fn get_session(&self, session_id: Uuid) -> StoreResult<Option<Session>> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned())
    }

    async fn terminate_session(&self, session_id: Uuid) -> StoreResult<Option<Session>> {
        let mut tables = self.lock();
        Ok(tables
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .map(|session| {
                session.terminated = Some(Utc::now());
                session.clone()
            }))
    }

    async fn list_keys(&self) -> StoreResult<Vec<TranslationKey>> {
        Ok(self.lock().keys.clone())
    }

    async fn get_key(&self, id: i64) -> StoreResult<Option<TranslationKey>> {
        Ok(self.lock().keys.iter().find(|k| k.id == id).cloned())
    }

    async fn create_key(&self, new: NewTranslationKey) -> StoreResult<TranslationKey> {
        let mut tables = self.lock();
        tables.check_key_unique(&new.key, None)?;
        let key = TranslationKey {
            id: next_id(&mut tables.next_key_id),
            key: new.key,
            key_type: new.key_type,
        };
        tables.keys.push(key.clone());
        Ok(key)
    }

    async fn update_key(
        &self,
        id: i64,
        update: NewTranslationKey,
    ) -> StoreResult<Option<TranslationKey>> {
        let mut tables = self.lock();
        if !tables.keys.iter().any(|k| k.id == id) {
            return Ok(None);
        }
        tables.check_key_unique(&update.key, Some(id))?;
        Ok(tables.keys.iter_mut().find(|k| k.id == id).map(|key| {
            key.key = update.key;
            key.key_type = update.key_type;
            key.clone()
        }))
    }

    async fn delete_key(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        let before = tables.keys.len();
        tables.keys.retain(|k| k.id != id);
        if tables.keys.len() == before {
            return Ok(false);
        }
        tables.translations.retain(|t| t.translation_key != id);
        Ok(true)
    }

    async fn list_languages(&self) -> StoreResult<Vec<Language>> {
        Ok(self.lock().languages.clone())
    }

    async fn get_language(&self, id: i64) -> StoreResult<Option<Language>> {
        Ok(self.lock().languages.iter().find(|l| l.id == id).cloned())
    }

    async fn create_language(&self, new: NewLanguage) -> StoreResult<Language> {
        let mut tables = self.lock();
        tables.check_language_unique(&new.lan_code, None)?;
        let language = Language {
            id: next_id(&mut tables.next_language_id),
            lan_code: new.lan_code,
            lan_name: new.lan_name,
            reg_code: new.reg_code,
            reg_name: new.reg_name,
        };
        tables.languages.push(language.clone());
        Ok(language)
    }

    async fn update_language(
        &self,
        id: i64,
        update: NewLanguage,
    ) -> StoreResult<Option<Language>> {
        let mut tables = self.lock();
        if !tables.languages.iter().any(|l| l.id == id) {
            return Ok(None);
        }
        tables.check_language_unique(&update.lan_code, Some(id))?;
        Ok(tables.languages.iter_mut().find(|l| l.id == id).map(|language| {
            language.lan_code = update.lan_code;
            language.lan_name = update.lan_name;
            language.reg_code = update.reg_code;
            language.reg_name = update.reg_name;
            language.clone()
        }))
    }

    async fn delete_language(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        let before = tables.languages.len();
        tables.languages.retain(|l| l.id != id);
        if tables.languages.len() == before {
            return Ok(false);
        }
        tables.translations.retain(|t| t.language != id);
        Ok(true)
    }

    async fn list_translations(&self) -> StoreResult<Vec<Translation>> {
        Ok(self.lock().translations.clone())
    }

    async fn translations_for_language(&self, language_id: i64) -> StoreResult<Vec<Translation>> {
        Ok(self
            .lock()
            .translations
            .iter()
            .filter(|t| t.language == language_id)
            .cloned()
            .collect())
    }

    async fn get_translation(&self, id: i64) -> StoreResult<Option<Translation>> {
        Ok(self.lock().translations.iter().find(|t| t.id == id).cloned())
    }

    async fn create_translation(&self, new: NewTranslation) -> StoreResult<Translation> {
        let mut tables = self.lock();
        tables.check_references(&new)?;
        let translation = Translation {
            id: next_id(&mut tables.next_translation_id),
            translation_key: new.translation_key,
            language: new.language,
            translation: new.translation,
            revision: new.revision,
        };
        tables.translations.push(translation.clone());
        Ok(translation)
    }

    async fn update_translation(
        &self,
        id: i64,
        update: NewTranslation,
    ) -> StoreResult<Option<Translation>> {
        let mut tables = self.lock();
        if !tables.translations.iter().any(|t| t.id == id) {
            return Ok(None);
        }
        tables.check_references(&update)?;
        Ok(tables
            .translations
            .iter_mut()
            .find(|t| t.id == id)
            .map(|translation| {
                translation.translation_key = update.translation_key;
                translation.language = update.language;
                translation.translation = update.translation;
                translation.revision = update.revision;
                translation.clone()
            }))
    }

    async fn delete_translation(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        let before = tables.translations.len();
        tables.translations.retain(|t| t.id != id);
        Ok(tables.translations.len() != before)
    }

    async fn list_assets(&self, kind: AssetKind) -> StoreResult<Vec<Asset>> {
        Ok(self.lock().assets.get(&kind).cloned().unwrap_or_default())
    }

    async fn get_asset(&self, kind: AssetKind, id: i64) -> StoreResult<Option<Asset>> {
        Ok(self
            .lock()
            .assets
            .get(&kind)
            .and_then(|rows| rows.iter().find(|a| a.id == id).cloned()))
    }

    async fn create_asset(&self, kind: AssetKind, new: NewAsset) -> StoreResult<Asset> {
        let mut tables = self.lock();
        if tables
            .assets
            .get(&kind)
            .is_some_and(|rows| rows.iter().any(|a| a.name == new.name))
        {
            return Err(StoreError::Conflict(format!(
                "{} with name '{}' already exists",
                kind, new.name
            )));
        }

        let now = Utc::now();
        let asset = Asset {
            id: next_id(tables.next_asset_id.entry(kind).or_default()),
            name: new.name,
            brief: new.brief,
            created: now,
            updated: now,
            desc_json: empty_description(),
        };
        tables.assets.entry(kind).or_default().push(asset.clone());
        Ok(asset)
    }

    async fn update_asset(
        &self,
        kind: AssetKind,
        id: i64,
        update: AssetUpdate,
    ) -> StoreResult<Option<Asset>> {
        let mut tables = self.lock();
        Ok(tables
            .assets
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|a| a.id == id))
            .map(|asset| {
                if let Some(desc_json) = update.desc_json {
                    asset.desc_json = desc_json;
                }
                asset.updated = Utc::now();
                asset.clone()
            }))
    }

    async fn delete_asset(&self, kind: AssetKind, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        let Some(rows) = tables.assets.get_mut(&kind) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeyType;

    // ==================== Helper Functions ====================

    fn new_key(key: &str) -> NewTranslationKey {
        NewTranslationKey {
            key: key.to_string(),
            key_type: KeyType::String,
        }
    }

    fn new_language(code: &str) -> NewLanguage {
        NewLanguage {
            lan_code: code.to_string(),
            lan_name: code.to_string(),
            reg_code: String::new(),
            reg_name: String::new(),
        }
    }

    fn new_translation(key: i64, language: i64, text: &str) -> NewTranslation {
        NewTranslation {
            translation_key: key,
            language,
            translation: text.to_string(),
            revision: 1,
        }
    }

    // ==================== Session Tests ====================

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();
        assert!(!session.is_terminated());

        let fetched = store.get_session(session.session_id).await.unwrap();
        assert_eq!(fetched, Some(session.clone()));

        let terminated = store
            .terminate_session(session.session_id)
            .await
            .unwrap()
            .expect("Session should exist");
        assert!(terminated.is_terminated());
    }

    #[tokio::test]
    async fn test_terminate_unknown_session() {
        let store = MemoryStore::new();
        let result = store.terminate_session(Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    // ==================== Key / Language Tests ====================

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        let a = store.create_key(new_key("a")).await.unwrap();
        let b = store.create_key(new_key("b")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_key_conflicts() {
        let store = MemoryStore::new();
        store.create_key(new_key("menu.file")).await.unwrap();
        let result = store.create_key(new_key("menu.file")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_key_to_own_name_is_allowed() {
        let store = MemoryStore::new();
        let key = store.create_key(new_key("menu.file")).await.unwrap();
        let updated = store
            .update_key(
                key.id,
                NewTranslationKey {
                    key: "menu.file".to_string(),
                    key_type: KeyType::Boolean,
                },
            )
            .await
            .unwrap()
            .expect("Key should exist");
        assert_eq!(updated.key_type, KeyType::Boolean);
    }

    #[tokio::test]
    async fn test_duplicate_language_conflicts() {
        let store = MemoryStore::new();
        store.create_language(new_language("de-DE")).await.unwrap();
        let result = store.create_language(new_language("de-DE")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    // ==================== Translation Tests ====================

    #[tokio::test]
    async fn test_translation_requires_existing_references() {
        let store = MemoryStore::new();
        let key = store.create_key(new_key("a")).await.unwrap();
        let result = store
            .create_translation(new_translation(key.id, 42, "x"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_delete_key_cascades() {
        let store = MemoryStore::new();
        let key = store.create_key(new_key("a")).await.unwrap();
        let other = store.create_key(new_key("b")).await.unwrap();
        let language = store.create_language(new_language("de-DE")).await.unwrap();
        store
            .create_translation(new_translation(key.id, language.id, "A"))
            .await
            .unwrap();
        store
            .create_translation(new_translation(other.id, language.id, "B"))
            .await
            .unwrap();

        assert!(store.delete_key(key.id).await.unwrap());
        let remaining = store.list_translations().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].translation_key, other.id);
    }

    #[tokio::test]
    async fn test_delete_language_cascades() {
        let store = MemoryStore::new();
        let key = store.create_key(new_key("a")).await.unwrap();
        let de = store.create_language(new_language("de-DE")).await.unwrap();
        let fr = store.create_language(new_language("fr-FR")).await.unwrap();
        store
            .create_translation(new_translation(key.id, de.id, "A"))
            .await
            .unwrap();
        store
            .create_translation(new_translation(key.id, fr.id, "A"))
            .await
            .unwrap();

        assert!(store.delete_language(de.id).await.unwrap());
        assert!(store
            .translations_for_language(de.id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.translations_for_language(fr.id).await.unwrap().len(), 1);
    }

    // ==================== Asset Tests ====================

    fn new_asset(name: &str) -> NewAsset {
        NewAsset {
            name: name.to_string(),
            brief: String::new(),
        }
    }

    #[tokio::test]
    async fn test_asset_names_are_unique_per_kind() {
        let store = MemoryStore::new();
        store
            .create_asset(AssetKind::Model, new_asset("Excavator"))
            .await
            .unwrap();

        let duplicate = store
            .create_asset(AssetKind::Model, new_asset("Excavator"))
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        // Same name in another table is fine
        let environment = store
            .create_asset(AssetKind::Environment, new_asset("Excavator"))
            .await
            .unwrap();
        assert_eq!(environment.id, 1);
        assert_eq!(store.list_assets(AssetKind::Model).await.unwrap().len(), 1);
        assert!(store.list_assets(AssetKind::Touchpoint).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_asset_only_touches_description() {
        let store = MemoryStore::new();
        let asset = store
            .create_asset(AssetKind::Touchpoint, new_asset("Door"))
            .await
            .unwrap();
        assert_eq!(asset.desc_json, serde_json::json!({}));

        let updated = store
            .update_asset(
                AssetKind::Touchpoint,
                asset.id,
                AssetUpdate {
                    desc_json: Some(serde_json::json!({"position": [1, 2, 3]})),
                },
            )
            .await
            .unwrap()
            .expect("Asset should exist");
        assert_eq!(updated.name, "Door");
        assert_eq!(updated.desc_json["position"][2], 3);
        assert!(updated.updated >= asset.updated);

        let unchanged = store
            .update_asset(AssetKind::Touchpoint, asset.id, AssetUpdate::default())
            .await
            .unwrap()
            .expect("Asset should exist");
        assert_eq!(unchanged.desc_json, updated.desc_json);

        assert!(store
            .update_asset(AssetKind::Model, asset.id, AssetUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_asset() {
        let store = MemoryStore::new();
        assert!(!store.delete_asset(AssetKind::Environment, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_rows() {
        let store = MemoryStore::new();
        assert!(!store.delete_key(1).await.unwrap());
        assert!(!store.delete_language(1).await.unwrap());
        assert!(!store.delete_translation(1).await.unwrap());
    }
}
