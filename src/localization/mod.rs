//! Localization core: translation trees, progress reporting and queries.
//!
//! The catalog lives in three tables: translation keys (dot-delimited
//! identifiers), languages, and translations linking one key to one language.
//! This module reshapes those rows for clients.
//!
//! # Architecture
//!
//! - `tree`: nested `Leaf`/`Branch` trees built from dotted key paths
//! - `progress`: completion ratio and missing entries per key and per language
//! - `query`: multi-language translation queries in nested or flat shape
//! - `validation`: rules for key strings and language codes
//!
//! Everything here works on a snapshot read at request time; nothing is cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use camerafy_backend::localization::{parse_language_codes, query_translations, Shape};
//!
//! let codes = parse_language_codes("de-DE,fr-FR");
//! let response = query_translations(&store, &codes, Shape::Flat).await?;
//! ```

mod progress;
mod query;
mod tree;
mod validation;

pub use progress::{key_progress, language_progress, ratio, Progress};
pub use query::{
    flat_translations, insert_nested, parse_language_codes, query_translations,
    FlatTranslation, QueryEntry, QueryResponse, Shape, NOT_SUPPORTED,
};
pub use tree::{insert_path, Branch, TranslationLeaf, TranslationNode};
pub use validation::{validate_key, validate_language_code, ValidationError};
