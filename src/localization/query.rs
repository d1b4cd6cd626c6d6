//! Multi-language translation queries.
//!
//! A query names one or more language codes and a response shape. Each
//! supported code resolves to every translation key of the catalog, with a
//! placeholder for keys that have no translation in that language. Unknown
//! codes degrade to an inline `"Not supported."` marker instead of failing
//! the whole request.

use super::tree::{insert_path, Branch, TranslationLeaf, TranslationNode};
use crate::models::{Language, Translation, TranslationKey};
use crate::store::{Store, StoreResult};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Marker returned for language codes that are not in the catalog
pub const NOT_SUPPORTED: &str = "Not supported.";

/// Response shape of a translation query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    /// One mapping level per key segment
    #[default]
    Nested,
    /// Full dotted key strings as map keys
    Flat,
}

impl Shape {
    pub fn from_flag(flat: bool) -> Self {
        if flat {
            Shape::Flat
        } else {
            Shape::Nested
        }
    }
}

/// Record of a flat response. Note the field is `translation` here while
/// nested leaves call it `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatTranslation {
    pub id: i64,
    pub revision: i64,
    pub translation: String,
}

impl From<TranslationLeaf> for FlatTranslation {
    fn from(leaf: TranslationLeaf) -> Self {
        Self {
            id: leaf.id,
            revision: leaf.revision,
            translation: leaf.value,
        }
    }
}

/// Value stored under one top-level language code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEntry {
    Unsupported,
    Flat(BTreeMap<String, FlatTranslation>),
    Nested(TranslationNode),
}

impl Serialize for QueryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueryEntry::Unsupported => serializer.serialize_str(NOT_SUPPORTED),
            QueryEntry::Flat(records) => records.serialize(serializer),
            QueryEntry::Nested(node) => node.serialize(serializer),
        }
    }
}

pub type QueryResponse = BTreeMap<String, QueryEntry>;

/// Split a comma-separated list of language codes into a set.
///
/// Items are trimmed and empty items dropped; the set is iterated in sorted order.
pub fn parse_language_codes(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// First translation of every key, where "first" is the lowest row id
fn first_by_key(translations: &[Translation]) -> HashMap<i64, &Translation> {
    let mut first: HashMap<i64, &Translation> = HashMap::new();
    for t in translations {
        first
            .entry(t.translation_key)
            .and_modify(|current| {
                if t.id < current.id {
                    *current = t;
                }
            })
            .or_insert(t);
    }
    first
}

/// Flat map of full key string to record for one language
pub fn flat_translations(
    keys: &[TranslationKey],
    translations: &[Translation],
) -> BTreeMap<String, FlatTranslation> {
    let first = first_by_key(translations);
    keys.iter()
        .map(|key| {
            let leaf = TranslationLeaf::from(first.get(&key.id).copied());
            (key.key.clone(), FlatTranslation::from(leaf))
        })
        .collect()
}

/// Insert every key of one language below `root` at `"{code}.{key}"`
pub fn insert_nested(
    root: &mut Branch,
    code: &str,
    keys: &[TranslationKey],
    translations: &[Translation],
) {
    let first = first_by_key(translations);
    for key in keys {
        let path = format!("{}.{}", code, key.key);
        insert_path(root, &path, first.get(&key.id).copied());
    }
}

/// Resolve a translation query against the store.
///
/// Languages are read once; keys and translations are re-read for every
/// supported code. In nested mode every language is inserted into one shared
/// tree whose top-level entries become the per-language values. A supported
/// language with no keys therefore contributes nothing in nested mode and an
/// empty map in flat mode.
pub async fn query_translations(
    store: &dyn Store,
    codes: &BTreeSet<String>,
    shape: Shape,
) -> StoreResult<QueryResponse> {
    let languages = store.list_languages().await?;
    let by_code: HashMap<&str, &Language> = languages
        .iter()
        .map(|language| (language.lan_code.as_str(), language))
        .collect();

    let mut response = QueryResponse::new();
    let mut unsupported = Vec::new();
    let mut tree = Branch::new();

    for code in codes {
        let Some(language) = by_code.get(code.as_str()) else {
            debug!("Language '{}' requested but not supported", code);
            unsupported.push(code.clone());
            continue;
        };

        let keys = store.list_keys().await?;
        let translations = store.translations_for_language(language.id).await?;

        match shape {
            Shape::Flat => {
                response.insert(
                    code.clone(),
                    QueryEntry::Flat(flat_translations(&keys, &translations)),
                );
            }
            Shape::Nested => insert_nested(&mut tree, code, &keys, &translations),
        }
    }

    for (segment, node) in tree {
        response.insert(segment, QueryEntry::Nested(node));
    }
    for code in unsupported {
        response.insert(code, QueryEntry::Unsupported);
    }

    Ok(response)
}
