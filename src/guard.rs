//! Placeholder guard for protecting non-translatable substrings
//!
//! Variable markers (`:name`, `{count}`), mentions (`@user`) and tags
//! (`#topic`) must survive machine translation byte-for-byte. Before a text
//! is sent to the provider every match of the configured patterns is swapped
//! for a numbered token (`___PLACEHOLDER_0___`, `___PLACEHOLDER_1___`, ...),
//! and the tokens are swapped back afterwards.
//!
//! Patterns are applied in configuration order. A match that overlaps a
//! token produced by an earlier pattern is left alone, so overlapping
//! patterns are resolved by order rather than by match length.
//!
//! Source text that already contains a token-shaped substring cannot be
//! restored faithfully.

use crate::error::{SyncError, SyncResult};
use regex::Regex;

const TOKEN_PREFIX: &str = "___PLACEHOLDER_";
const TOKEN_SUFFIX: &str = "___";

/// Ordered (token, original substring) pairs recorded while masking
pub type PlaceholderMap = Vec<(String, String)>;

/// A masked text and what it takes to restore it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedText {
    pub text: String,
    pub placeholders: PlaceholderMap,
}

/// Masks and restores placeholder substrings
#[derive(Debug, Clone)]
pub struct PlaceholderGuard {
    patterns: Vec<Regex>,
    token_pattern: Regex,
}

impl PlaceholderGuard {
    /// Compile the placeholder patterns
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - Guard applying the patterns in the given order
    /// * `Err(SyncError::Configuration)` - If a pattern is not a valid regex
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> SyncResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern.as_ref()).map_err(|e| {
                    SyncError::Configuration(format!(
                        "Invalid placeholder pattern '{}': {}",
                        pattern.as_ref(),
                        e
                    ))
                })
            })
            .collect::<SyncResult<Vec<_>>>()?;

        let token_pattern = Regex::new(&format!(
            "{}[0-9]+{}",
            regex::escape(TOKEN_PREFIX),
            regex::escape(TOKEN_SUFFIX)
        ))
        .map_err(|e| SyncError::Configuration(e.to_string()))?;

        Ok(Self {
            patterns,
            token_pattern,
        })
    }

    /// Replace every pattern match with a unique sequential token
    ///
    /// # Example
    ///
    /// ```ignore
    /// let guard = PlaceholderGuard::new(&[r":\w+", r"\{\w+\}"])?;
    /// let masked = guard.mask("Hi :name, {count} new");
    /// assert_eq!(masked.text, "Hi ___PLACEHOLDER_0___, ___PLACEHOLDER_1___ new");
    /// ```
    pub fn mask(&self, text: &str) -> MaskedText {
        let mut masked = text.to_string();
        let mut placeholders = PlaceholderMap::new();

        for pattern in &self.patterns {
            let protected: Vec<(usize, usize)> = self
                .token_pattern
                .find_iter(&masked)
                .map(|m| (m.start(), m.end()))
                .collect();

            let mut result = String::with_capacity(masked.len());
            let mut last = 0;
            for m in pattern.find_iter(&masked) {
                let overlaps = protected
                    .iter()
                    .any(|&(start, end)| m.start() < end && start < m.end());
                if overlaps || m.as_str().is_empty() {
                    continue;
                }

                let token = format!("{}{}{}", TOKEN_PREFIX, placeholders.len(), TOKEN_SUFFIX);
                result.push_str(&masked[last..m.start()]);
                result.push_str(&token);
                placeholders.push((token, m.as_str().to_string()));
                last = m.end();
            }
            result.push_str(&masked[last..]);
            masked = result;
        }

        MaskedText {
            text: masked,
            placeholders,
        }
    }

    /// Put the original substrings back in place of their tokens
    ///
    /// Plain substring replacement: a token the provider dropped or mangled is
    /// simply not found, and a mangled token stays in the output verbatim.
    pub fn unmask(text: &str, placeholders: &PlaceholderMap) -> String {
        placeholders
            .iter()
            .fold(text.to_string(), |acc, (token, original)| {
                acc.replace(token, original)
            })
    }

    /// Tokens that do not appear in `text`
    ///
    /// Checked on the provider output before unmasking; a non-empty result
    /// means the restored text lost at least one placeholder.
    pub fn missing_tokens<'a>(text: &str, placeholders: &'a PlaceholderMap) -> Vec<&'a str> {
        placeholders
            .iter()
            .filter(|(token, _)| !text.contains(token.as_str()))
            .map(|(token, _)| token.as_str())
            .collect()
    }
}
