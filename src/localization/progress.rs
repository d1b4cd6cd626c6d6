//! Translation progress per key and per language.
//!
//! A key is covered by a language when at least one translation row links
//! them. Progress is the covered share of the other dimension.

use crate::models::{Language, Translation, TranslationKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Completion of one key (across languages) or one language (across keys)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub id: i64,
    /// Covered share in `[0, 1]`
    pub progress: f64,
    /// Language codes (for a key) or key strings (for a language) without a translation
    pub missing: Vec<String>,
}

/// `covered / total`, or exactly `0.0` when `total` is zero
pub fn ratio(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    covered as f64 / total as f64
}

/// Progress of every key, keyed by the key string.
///
/// `missing` lists language codes in language id order.
pub fn key_progress(
    keys: &[TranslationKey],
    languages: &[Language],
    translations: &[Translation],
) -> BTreeMap<String, Progress> {
    let mut covered: HashMap<i64, HashSet<i64>> = HashMap::new();
    for t in translations {
        covered.entry(t.translation_key).or_default().insert(t.language);
    }

    let empty = HashSet::new();
    keys.iter()
        .map(|key| {
            let languages_done = covered.get(&key.id).unwrap_or(&empty);
            let missing: Vec<String> = languages
                .iter()
                .filter(|language| !languages_done.contains(&language.id))
                .map(|language| language.lan_code.clone())
                .collect();
            let progress = Progress {
                id: key.id,
                progress: ratio(languages.len() - missing.len(), languages.len()),
                missing,
            };
            (key.key.clone(), progress)
        })
        .collect()
}

/// Progress of every language, keyed by language code.
///
/// `missing` lists key strings in key id order.
pub fn language_progress(
    keys: &[TranslationKey],
    languages: &[Language],
    translations: &[Translation],
) -> BTreeMap<String, Progress> {
    let mut covered: HashMap<i64, HashSet<i64>> = HashMap::new();
    for t in translations {
        covered.entry(t.language).or_default().insert(t.translation_key);
    }

    let empty = HashSet::new();
    languages
        .iter()
        .map(|language| {
            let keys_done = covered.get(&language.id).unwrap_or(&empty);
            let missing: Vec<String> = keys
                .iter()
                .filter(|key| !keys_done.contains(&key.id))
                .map(|key| key.key.clone())
                .collect();
            let progress = Progress {
                id: language.id,
                progress: ratio(keys.len() - missing.len(), keys.len()),
                missing,
            };
            (language.lan_code.clone(), progress)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeyType;
    use proptest::prelude::*;

    // ==================== Helper Functions ====================

    fn key(id: i64, key: &str) -> TranslationKey {
        TranslationKey {
            id,
            key: key.to_string(),
            key_type: KeyType::String,
        }
    }

    fn language(id: i64, code: &str) -> Language {
        Language {
            id,
            lan_code: code.to_string(),
            lan_name: code.to_string(),
            reg_code: String::new(),
            reg_name: String::new(),
        }
    }

    fn translation(id: i64, key: i64, language: i64) -> Translation {
        Translation {
            id,
            translation_key: key,
            language,
            translation: format!("t{}", id),
            revision: 0,
        }
    }

    // ==================== ratio Tests ====================

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(0, 0), 0.0);
    }

    #[test]
    fn test_ratio_fraction() {
        assert_eq!(ratio(1, 4), 0.25);
        assert_eq!(ratio(3, 3), 1.0);
    }

    // ==================== key_progress Tests ====================

    #[test]
    fn test_key_progress_partial() {
        let keys = vec![key(1, "menu.file.open"), key(2, "menu.file.save")];
        let languages = vec![language(1, "de-DE"), language(2, "fr-FR")];
        let translations = vec![translation(1, 1, 1)];

        let report = key_progress(&keys, &languages, &translations);

        assert_eq!(report["menu.file.open"].id, 1);
        assert_eq!(report["menu.file.open"].progress, 0.5);
        assert_eq!(report["menu.file.open"].missing, vec!["fr-FR"]);
        assert_eq!(report["menu.file.save"].progress, 0.0);
        assert_eq!(report["menu.file.save"].missing, vec!["de-DE", "fr-FR"]);
    }

    #[test]
    fn test_key_progress_counts_duplicate_rows_once() {
        let keys = vec![key(1, "a")];
        let languages = vec![language(1, "de-DE"), language(2, "fr-FR")];
        let translations = vec![translation(1, 1, 1), translation(2, 1, 1)];

        let report = key_progress(&keys, &languages, &translations);
        assert_eq!(report["a"].progress, 0.5);
    }

    #[test]
    fn test_key_progress_without_languages() {
        let keys = vec![key(1, "a")];
        let report = key_progress(&keys, &[], &[]);
        assert_eq!(report["a"].progress, 0.0);
        assert!(report["a"].missing.is_empty());
    }

    #[test]
    fn test_key_progress_ignores_rows_of_unknown_languages() {
        let keys = vec![key(1, "a")];
        let languages = vec![language(1, "de-DE")];
        let translations = vec![translation(1, 1, 99)];

        let report = key_progress(&keys, &languages, &translations);
        assert_eq!(report["a"].progress, 0.0);
        assert_eq!(report["a"].missing, vec!["de-DE"]);
    }

    // ==================== language_progress Tests ====================

    #[test]
    fn test_language_progress_complete_and_empty() {
        let keys = vec![key(1, "a"), key(2, "b")];
        let languages = vec![language(1, "de-DE"), language(2, "fr-FR")];
        let translations = vec![translation(1, 1, 1), translation(2, 2, 1)];

        let report = language_progress(&keys, &languages, &translations);

        assert_eq!(report["de-DE"].progress, 1.0);
        assert!(report["de-DE"].missing.is_empty());
        assert_eq!(report["fr-FR"].id, 2);
        assert_eq!(report["fr-FR"].progress, 0.0);
        assert_eq!(report["fr-FR"].missing, vec!["a", "b"]);
    }

    #[test]
    fn test_language_progress_without_keys() {
        let languages = vec![language(1, "de-DE")];
        let report = language_progress(&[], &languages, &[]);
        assert_eq!(report["de-DE"].progress, 0.0);
    }

    #[test]
    fn test_progress_serializes_fields() {
        let report = key_progress(&[key(7, "a")], &[language(1, "de-DE")], &[]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"a": {"id": 7, "progress": 0.0, "missing": ["de-DE"]}})
        );
    }

    // ==================== Property Tests ====================

    fn dataset() -> impl Strategy<Value = (usize, usize, Vec<(i64, i64)>)> {
        (0usize..6, 0usize..6).prop_flat_map(|(k, l)| {
            let links = prop::collection::vec((0i64..8, 0i64..8), 0..30);
            (Just(k), Just(l), links)
        })
    }

    fn build(
        key_count: usize,
        language_count: usize,
        links: &[(i64, i64)],
    ) -> (Vec<TranslationKey>, Vec<Language>, Vec<Translation>) {
        let keys = (1..=key_count as i64)
            .map(|id| key(id, &format!("k{}", id)))
            .collect();
        let languages = (1..=language_count as i64)
            .map(|id| language(id, &format!("l{}", id)))
            .collect();
        let translations = links
            .iter()
            .enumerate()
            .map(|(i, (k, l))| translation(i as i64 + 1, *k, *l))
            .collect();
        (keys, languages, translations)
    }

    proptest! {
        #[test]
        fn prop_progress_within_bounds((k, l, links) in dataset()) {
            let (keys, languages, translations) = build(k, l, &links);
            for p in key_progress(&keys, &languages, &translations).values()
                .chain(language_progress(&keys, &languages, &translations).values())
            {
                prop_assert!((0.0..=1.0).contains(&p.progress));
            }
        }

        #[test]
        fn prop_missing_complements_coverage((k, l, links) in dataset()) {
            let (keys, languages, translations) = build(k, l, &links);

            for p in key_progress(&keys, &languages, &translations).values() {
                let unique: HashSet<&String> = p.missing.iter().collect();
                prop_assert_eq!(unique.len(), p.missing.len());
                let translated = (p.progress * languages.len() as f64).round() as usize;
                prop_assert_eq!(translated + p.missing.len(), languages.len());
            }

            for p in language_progress(&keys, &languages, &translations).values() {
                let unique: HashSet<&String> = p.missing.iter().collect();
                prop_assert_eq!(unique.len(), p.missing.len());
                let translated = (p.progress * keys.len() as f64).round() as usize;
                prop_assert_eq!(translated + p.missing.len(), keys.len());
            }
        }
    }
}
