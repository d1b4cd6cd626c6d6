//! Rows of the datastore and the payloads used to create or update them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ==================== Sessions ====================

/// An interactive Camerafy session.
///
/// `terminated` is `None` while the session is still active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub created: DateTime<Utc>,
    pub terminated: Option<DateTime<Utc>>,
}

impl Session {
    /// A fresh, active session
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created: Utc::now(),
            terminated: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.is_some()
    }

    /// Seconds between creation and termination, or until `now` for active sessions
    pub fn elapsed_seconds_at(&self, now: DateTime<Utc>) -> f64 {
        let end = self.terminated.unwrap_or(now);
        (end - self.created).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Localization ====================

/// Value type of a translation key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    #[default]
    String,
    Boolean,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "STRING",
            KeyType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRING" => Ok(KeyType::String),
            "BOOLEAN" => Ok(KeyType::Boolean),
            other => Err(format!("Unknown key type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationKey {
    pub id: i64,
    pub key: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTranslationKey {
    pub key: String,
    #[serde(rename = "type", default)]
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: i64,
    pub lan_code: String,
    pub lan_name: String,
    pub reg_code: String,
    pub reg_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLanguage {
    pub lan_code: String,
    pub lan_name: String,
    #[serde(default)]
    pub reg_code: String,
    #[serde(default)]
    pub reg_name: String,
}

/// The translated string of one (key, language) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: i64,
    pub translation_key: i64,
    pub language: i64,
    pub translation: String,
    pub revision: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTranslation {
    pub translation_key: i64,
    pub language: i64,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub revision: i64,
}

// ==================== 3D content ====================

/// Kind of content described by an [`Asset`] row. Every kind lives in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    Environment,
    Touchpoint,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Model, AssetKind::Environment, AssetKind::Touchpoint];

    pub fn table(&self) -> &'static str {
        match self {
            AssetKind::Model => "camfy_models",
            AssetKind::Environment => "camfy_environments",
            AssetKind::Touchpoint => "camfy_touchpoints",
        }
    }

    /// URL segment of the collection
    pub fn path(&self) -> &'static str {
        match self {
            AssetKind::Model => "models",
            AssetKind::Environment => "environments",
            AssetKind::Touchpoint => "touchpoints",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Model => "Model",
            AssetKind::Environment => "Environment",
            AssetKind::Touchpoint => "Touchpoint",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata of a model, environment or touchpoint.
///
/// `desc_json` is an opaque JSON document owned by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub brief: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub desc_json: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    #[serde(default)]
    pub brief: String,
}

/// Only the description can change after creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetUpdate {
    #[serde(default)]
    pub desc_json: Option<Value>,
}

/// Description of a freshly created asset
pub fn empty_description() -> Value {
    Value::Object(Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_session_is_active() {
        let session = Session::new();
        assert!(!session.is_terminated());
        assert!(session.terminated.is_none());
    }

    #[test]
    fn test_elapsed_active_session_uses_now() {
        let mut session = Session::new();
        session.created = Utc::now() - Duration::seconds(90);
        let elapsed = session.elapsed_seconds_at(session.created + Duration::seconds(90));
        assert_eq!(elapsed, 90.0);
    }

    #[test]
    fn test_elapsed_terminated_session_is_frozen() {
        let mut session = Session::new();
        session.terminated = Some(session.created + Duration::milliseconds(1500));
        let later = session.created + Duration::hours(5);
        assert_eq!(session.elapsed_seconds_at(later), 1.5);
    }

    #[test]
    fn test_key_type_serializes_uppercase() {
        let json = serde_json::to_string(&KeyType::Boolean).unwrap();
        assert_eq!(json, "\"BOOLEAN\"");
        assert_eq!("STRING".parse::<KeyType>(), Ok(KeyType::String));
        assert!("string".parse::<KeyType>().is_err());
    }

    #[test]
    fn test_translation_key_type_field_name() {
        let key = TranslationKey {
            id: 3,
            key: "menu.file".to_string(),
            key_type: KeyType::String,
        };
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value["type"], "STRING");
        assert_eq!(value["key"], "menu.file");
    }

    #[test]
    fn test_asset_kind_tables_are_distinct() {
        let tables: std::collections::HashSet<&str> =
            AssetKind::ALL.iter().map(|kind| kind.table()).collect();
        assert_eq!(tables.len(), 3);
        assert_eq!(AssetKind::Model.path(), "models");
        assert_eq!(AssetKind::Touchpoint.to_string(), "Touchpoint");
    }

    #[test]
    fn test_new_asset_requires_name() {
        let payload: NewAsset = serde_json::from_str(r#"{"name": "Excavator"}"#).unwrap();
        assert_eq!(payload.brief, "");
        assert!(serde_json::from_str::<NewAsset>(r#"{"brief": "no name"}"#).is_err());
    }

    #[test]
    fn test_asset_update_without_description() {
        let update: AssetUpdate = serde_json::from_str(r#"{"name": "ignored"}"#).unwrap();
        assert!(update.desc_json.is_none());
    }

    #[test]
    fn test_new_translation_defaults() {
        let payload: NewTranslation =
            serde_json::from_str(r#"{"translation_key": 1, "language": 2}"#).unwrap();
        assert_eq!(payload.translation, "");
        assert_eq!(payload.revision, 0);
    }
}
