//! Mock Machine Translator for testing and dry runs
//!
//! This module provides a deterministic, API-free translator so the batch
//! pipeline can be exercised without API keys or network access.
//!
//! # Example
//!
//! ```ignore
//! use i18n_autotranslate::mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let texts = vec!["hello".to_string()];
//!     let result = mock.translate_batch(&texts, "en", "fr").await.unwrap();
//!     assert_eq!(result, vec!["hello_fr"]);
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{LanguageInfo, MachineTranslator};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hello" → "hello_fr"
    Suffix,

    /// Append a fixed string: "hello" with `Append("-FR")` → "hello-FR"
    Append(String),

    /// Uppercase every text: "hello" → "HELLO"
    Uppercase,

    /// Use predefined mappings for realistic translations
    /// (text, target_locale) → translation, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Drop the last text of every batch, breaking the length guarantee
    Truncate,

    /// Simulate API errors
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
///
/// Each mode simulates a different provider behavior. Transient outages can
/// be scripted with [`MockTranslator::failing_first`], and
/// [`MockTranslator::call_count`] exposes how many batch calls were made.
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    /// Number of leading batch calls that fail before the mode applies
    failures: usize,
    calls: AtomicUsize,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::new(MockMode::Suffix);
    /// ```
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            failures: 0,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a MockTranslator with simulated network delay
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
    /// // Each batch will take ~50ms
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Make the first `failures` batch calls fail with a transient error
    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    /// Number of batch calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Internal helper to apply the simulated delay
    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix | MockMode::Truncate => Ok(format!("{}_{}", text, target)),
            MockMode::Append(suffix) => Ok(format!("{}{}", text, suffix)),
            MockMode::Uppercase => Ok(text.to_uppercase()),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        _source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        // Apply simulated delay (per batch, not per string)
        self.apply_delay().await;

        if call < self.failures {
            return Err(MtError::NetworkError(format!(
                "simulated outage (call {})",
                call + 1
            )));
        }

        let mut results = texts
            .iter()
            .map(|text| self.apply_translation(text, target_locale))
            .collect::<MtResult<Vec<_>>>()?;

        if matches!(self.mode, MockMode::Truncate) {
            results.pop();
        }

        Ok(results)
    }

    async fn supported_languages(&self, _display_locale: &str) -> MtResult<Vec<LanguageInfo>> {
        Ok([
            ("ar", "Arabic"),
            ("de", "German"),
            ("en", "English"),
            ("es", "Spanish"),
            ("fr", "French"),
        ]
        .into_iter()
        .map(|(code, name)| LanguageInfo {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect())
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
