//! Validation of translation keys and language codes.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Translation key must not be empty")]
    EmptyKey,

    #[error("Translation key '{0}' may only contain letters, digits, '_' and '.'")]
    IllegalCharacters(String),

    #[error("Translation key '{0}' must not end with '.' or '_'")]
    TrailingSeparator(String),

    #[error("Language code must not be empty")]
    EmptyLanguageCode,

    #[error("Language code '{0}' must not contain ',' or whitespace")]
    IllegalLanguageCode(String),
}

static KEY_REGEX: OnceLock<Regex> = OnceLock::new();

fn key_regex() -> &'static Regex {
    KEY_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.]+$").expect("key pattern is valid"))
}

/// Check a dot-delimited translation key such as `menu.file.open`
pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    if !key_regex().is_match(key) {
        return Err(ValidationError::IllegalCharacters(key.to_string()));
    }
    if key.ends_with('.') || key.ends_with('_') {
        return Err(ValidationError::TrailingSeparator(key.to_string()));
    }
    Ok(())
}

/// Check a language code. Queries split on commas, so a code containing one
/// could never be requested.
pub fn validate_language_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::EmptyLanguageCode);
    }
    if code.contains(',') || code.chars().any(char::is_whitespace) {
        return Err(ValidationError::IllegalLanguageCode(code.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== validate_key Tests ====================

    #[test]
    fn test_valid_keys() {
        assert_eq!(validate_key("menu.file.open"), Ok(()));
        assert_eq!(validate_key("title"), Ok(()));
        assert_eq!(validate_key("user_profile.first_name"), Ok(()));
        assert_eq!(validate_key("level2.item10"), Ok(()));
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(validate_key(""), Err(ValidationError::EmptyKey));
    }

    #[test]
    fn test_illegal_characters() {
        for key in ["menu-file", "menu file", "menü", "menu/open", "a.b!"] {
            assert!(
                matches!(validate_key(key), Err(ValidationError::IllegalCharacters(_))),
                "{} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_trailing_separator() {
        assert_eq!(
            validate_key("menu."),
            Err(ValidationError::TrailingSeparator("menu.".to_string()))
        );
        assert_eq!(
            validate_key("menu_"),
            Err(ValidationError::TrailingSeparator("menu_".to_string()))
        );
    }

    #[test]
    fn test_error_message_names_key() {
        let err = validate_key("bad key").unwrap_err();
        assert!(err.to_string().contains("bad key"));
    }

    // ==================== validate_language_code Tests ====================

    #[test]
    fn test_language_codes() {
        assert_eq!(validate_language_code("de-DE"), Ok(()));
        assert_eq!(
            validate_language_code(""),
            Err(ValidationError::EmptyLanguageCode)
        );
        assert!(validate_language_code("de,DE").is_err());
        assert!(validate_language_code("de DE").is_err());
    }
}
