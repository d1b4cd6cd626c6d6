//! Camerafy backend.
//!
//! Tracks interactive Camerafy sessions and manages the localization catalog
//! (translation keys, languages and translations) behind a JSON HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod localization;
pub mod models;
pub mod retry;
pub mod security;
pub mod sessions;
pub mod store;
