//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! so the batch pipeline can drive Google Translate, the mock provider, or any
//! other backend without knowing which one it is talking to.
//!
//! # Example
//!
//! ```ignore
//! use i18n_autotranslate::mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::new(api_key)?;
//!
//!     let texts = vec!["Hello".to_string(), "Goodbye".to_string()];
//!     let results = provider.translate_batch(&texts, "en", "fr").await?;
//!     println!("{:?}", results);
//!
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A language the provider can translate into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Language code as the provider spells it (e.g. "fr", "zh-TW")
    pub code: String,
    /// Human-readable name, falling back to the code when the provider omits it
    pub name: String,
}

/// Generic trait for machine translation providers
///
/// Implementations handle the actual translation work, whether through an
/// API (Google Translate) or deterministic logic (Mock). A provider handle is
/// stateless from the pipeline's point of view and is shared across batches
/// and locale runs.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate multiple strings in a single batch operation
    ///
    /// # Arguments
    ///
    /// * `texts` - Strings to translate
    /// * `source_locale` - Source language code
    /// * `target_locale` - Target language code
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Translated strings in the same order as input
    /// * `Err(MtError)` - If translation fails
    ///
    /// # Guarantees
    ///
    /// - Output order matches input order
    /// - Output length equals input length
    ///
    /// Callers must still verify the length: a provider that breaks the
    /// guarantee would silently shift every translation onto the wrong key.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>>;

    /// List the languages this provider can translate into
    ///
    /// `display_locale` selects the language the names are written in.
    /// Providers without a catalogue return an empty list.
    async fn supported_languages(&self, _display_locale: &str) -> MtResult<Vec<LanguageInfo>> {
        Ok(Vec::new())
    }

    /// Get the name of this translation provider
    ///
    /// Used for logging to identify which provider handled a translation.
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code into the BCP 47 shape providers expect
///
/// Resource directories often use POSIX-style codes (`pt_BR`), while
/// translation APIs want hyphenated tags:
/// - `pt_BR` → `pt-BR`
/// - `EN` → `en`
/// - `zh-tw` → `zh-TW`
///
/// The language subtag is lowercased; a two-letter region subtag is
/// uppercased; other subtags are left alone.
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_locale("pt_BR"), "pt-BR");
/// assert_eq!(normalize_locale("zh-Hans"), "zh-Hans");
/// ```
pub fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .enumerate()
        .map(|(i, part)| match i {
            0 => part.to_lowercase(),
            _ if part.len() == 2 => part.to_uppercase(),
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Validate that a locale code is in acceptable format
///
/// Checks that the locale code contains only alphanumeric characters,
/// hyphens, and underscores (following ISO 639 conventions).
///
/// # Arguments
///
/// * `locale` - The locale code to validate
///
/// # Returns
///
/// * `Ok(())` - If the locale is valid
/// * `Err(MtError)` - If the locale is invalid
///
/// # Example
///
/// ```ignore
/// validate_locale("en")?; // OK
/// validate_locale("en-US")?; // OK
/// validate_locale("invalid@code").unwrap_err(); // Error
/// ```
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    // Check that locale contains only valid characters
    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Normalization Tests ==========

    #[test]
    fn test_normalize_locale_underscore_region() {
        assert_eq!(normalize_locale("pt_BR"), "pt-BR");
        assert_eq!(normalize_locale("en_gb"), "en-GB");
    }

    #[test]
    fn test_normalize_locale_keeps_script() {
        assert_eq!(normalize_locale("zh-Hans"), "zh-Hans");
        assert_eq!(normalize_locale("sr_Latn"), "sr-Latn");
    }

    #[test]
    fn test_normalize_locale_already_simple() {
        assert_eq!(normalize_locale("en"), "en");
        assert_eq!(normalize_locale("fr"), "fr");
    }

    #[test]
    fn test_normalize_locale_case_insensitive() {
        assert_eq!(normalize_locale("EN"), "en");
        assert_eq!(normalize_locale("ZH-tw"), "zh-TW");
    }

    // ========== Validation Tests ==========

    #[test]
    fn test_validate_locale_valid_codes() {
        assert!(validate_locale("en").is_ok());
        assert!(validate_locale("en-US").is_ok());
        assert!(validate_locale("zh-Hans").is_ok());
        assert!(validate_locale("de_DE").is_ok());
    }

    #[test]
    fn test_validate_locale_invalid_codes() {
        assert!(validate_locale("").is_err());
        assert!(validate_locale("en@invalid").is_err());
        assert!(validate_locale("fr#bad").is_err());
        assert!(validate_locale("es!error").is_err());
    }

    #[test]
    fn test_validate_locale_error_messages() {
        match validate_locale("en@US") {
            Err(MtError::InvalidLocale(msg)) => {
                assert!(msg.contains("Invalid characters"));
            }
            _ => panic!("Expected InvalidLocale error"),
        }
    }
}
