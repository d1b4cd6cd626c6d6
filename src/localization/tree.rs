//! Nested translation trees.
//!
//! Dotted key paths such as `de-DE.menu.file.open` are materialized as one
//! mapping level per segment, with a leaf `{id, revision, value}` at the end.

use crate::models::Translation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Children of a branch, kept in key order
pub type Branch = BTreeMap<String, TranslationNode>;

/// Leaf of a translation tree.
///
/// A missing translation is represented by [`TranslationLeaf::missing`]
/// (`id == -1`); clients rely on that id to detect untranslated keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationLeaf {
    pub id: i64,
    pub revision: i64,
    pub value: String,
}

impl TranslationLeaf {
    /// Id carried by the placeholder for a missing translation
    pub const MISSING_ID: i64 = -1;

    pub fn missing() -> Self {
        Self {
            id: Self::MISSING_ID,
            revision: 0,
            value: String::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.id == Self::MISSING_ID
    }
}

impl From<Option<&Translation>> for TranslationLeaf {
    fn from(record: Option<&Translation>) -> Self {
        match record {
            Some(t) => Self {
                id: t.id,
                revision: t.revision,
                value: t.translation.clone(),
            },
            None => Self::missing(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationNode {
    Leaf(TranslationLeaf),
    Branch(Branch),
}

impl TranslationNode {
    /// All leaves below this node with their dotted paths (relative to this node)
    pub fn leaves(&self) -> Vec<(String, &TranslationLeaf)> {
        let mut out = Vec::new();
        collect_leaves(self, String::new(), &mut out);
        out
    }
}

fn collect_leaves<'a>(
    node: &'a TranslationNode,
    prefix: String,
    out: &mut Vec<(String, &'a TranslationLeaf)>,
) {
    match node {
        TranslationNode::Leaf(leaf) => out.push((prefix, leaf)),
        TranslationNode::Branch(children) => {
            for (segment, child) in children {
                let path = if prefix.is_empty() {
                    segment.clone()
                } else {
                    format!("{}.{}", prefix, segment)
                };
                collect_leaves(child, path, out);
            }
        }
    }
}

/// Insert a leaf at `key_path` below `root`, creating intermediate branches.
///
/// Writes are last-write-wins: when one key is a prefix of another (`a` and
/// `a.b`), whichever is inserted later replaces the node of the other and the
/// earlier leaf or subtree is lost.
pub fn insert_path(root: &mut Branch, key_path: &str, record: Option<&Translation>) {
    let mut segments = key_path.split('.');
    let Some(last) = segments.next_back() else {
        return;
    };

    let mut level = root;
    for segment in segments {
        let node = level
            .entry(segment.to_string())
            .or_insert_with(|| TranslationNode::Branch(Branch::new()));
        if let TranslationNode::Leaf(_) = node {
            *node = TranslationNode::Branch(Branch::new());
        }
        let TranslationNode::Branch(children) = node else {
            // converted to a branch just above
            return;
        };
        level = children;
    }

    level.insert(
        last.to_string(),
        TranslationNode::Leaf(TranslationLeaf::from(record)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translation(id: i64, revision: i64, text: &str) -> Translation {
        Translation {
            id,
            translation_key: 1,
            language: 1,
            translation: text.to_string(),
            revision,
        }
    }

    #[test]
    fn test_insert_creates_intermediate_levels() {
        let mut root = Branch::new();
        let record = translation(1, 1, "Öffnen");
        insert_path(&mut root, "de-DE.menu.file.open", Some(&record));

        let value = serde_json::to_value(&root).unwrap();
        assert_eq!(
            value,
            json!({"de-DE": {"menu": {"file": {"open": {"id": 1, "revision": 1, "value": "Öffnen"}}}}})
        );
    }

    #[test]
    fn test_missing_record_inserts_sentinel() {
        let mut root = Branch::new();
        insert_path(&mut root, "menu.file.save", None);

        let value = serde_json::to_value(&root).unwrap();
        assert_eq!(
            value["menu"]["file"]["save"],
            json!({"id": -1, "revision": 0, "value": ""})
        );
    }

    #[test]
    fn test_siblings_share_branches() {
        let mut root = Branch::new();
        insert_path(&mut root, "menu.file.open", None);
        insert_path(&mut root, "menu.file.save", None);
        insert_path(&mut root, "menu.edit", None);

        let TranslationNode::Branch(menu) = &root["menu"] else {
            panic!("menu should be a branch");
        };
        assert_eq!(menu.len(), 2);
        let paths: Vec<String> = TranslationNode::Branch(root.clone())
            .leaves()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(paths, vec!["menu.edit", "menu.file.open", "menu.file.save"]);
    }

    #[test]
    fn test_single_segment_key() {
        let mut root = Branch::new();
        let record = translation(5, 2, "Titel");
        insert_path(&mut root, "title", Some(&record));
        assert_eq!(
            root["title"],
            TranslationNode::Leaf(TranslationLeaf {
                id: 5,
                revision: 2,
                value: "Titel".to_string()
            })
        );
    }

    // ==================== Prefix Collision Tests ====================

    #[test]
    fn test_longer_key_overwrites_leaf() {
        let mut root = Branch::new();
        let record = translation(1, 1, "A");
        insert_path(&mut root, "a", Some(&record));
        insert_path(&mut root, "a.b", None);

        let value = serde_json::to_value(&root).unwrap();
        assert_eq!(value, json!({"a": {"b": {"id": -1, "revision": 0, "value": ""}}}));
    }

    #[test]
    fn test_shorter_key_overwrites_branch() {
        let mut root = Branch::new();
        insert_path(&mut root, "a.b", None);
        let record = translation(1, 1, "A");
        insert_path(&mut root, "a", Some(&record));

        let value = serde_json::to_value(&root).unwrap();
        assert_eq!(value, json!({"a": {"id": 1, "revision": 1, "value": "A"}}));
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(TranslationLeaf::missing().is_missing());
        assert!(!TranslationLeaf::from(Some(&translation(3, 0, ""))).is_missing());
    }
}
