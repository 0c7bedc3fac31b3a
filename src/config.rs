//! Configuration for the translation pipeline.
//!
//! Loaded from a TOML file (every key optional), then overridden from the
//! environment. The resulting value is passed explicitly into the batch
//! translator and the synchronizer; nothing in the core looks settings up on
//! its own.
//!
//! ```toml
//! provider = "google"
//! source_locale = "en"
//! target_locales = ["fr", "es", "ar"]
//! lang_path = "resources/lang"
//! batch_size = 100
//! skip_keys = ["validation.attributes", "validation.custom"]
//!
//! [google]
//! api_key = "..."
//!
//! [retry]
//! attempts = 3
//! delay_ms = 1000
//! ```

use crate::error::{SyncError, SyncResult};
use crate::guard::PlaceholderGuard;
use crate::mt::normalize_locale;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "autotranslate.toml";

/// Which translation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
    /// Deterministic suffix translator, for dry runs
    Mock,
}

impl std::str::FromStr for ProviderKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(SyncError::Configuration(format!(
                "Unsupported translation provider '{}', expected 'google' or 'mock'",
                other
            ))),
        }
    }
}

/// Google Translate credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
}

/// Retry policy for a failed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total provider calls per batch, including the first
    pub attempts: u32,
    /// Fixed pause between attempts
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub provider: ProviderKind,
    pub google: GoogleConfig,
    pub source_locale: String,
    /// Locales `translate_all` processes
    pub target_locales: Vec<String>,
    /// Root directory of the resource files
    pub lang_path: PathBuf,
    pub batch_size: usize,
    /// Regexes for substrings that must not be translated, applied in order
    pub preserve_patterns: Vec<String>,
    /// Dotted-path prefixes that are never translated
    pub skip_keys: Vec<String>,
    /// Pause after each successful batch
    pub rate_limit_delay_ms: u64,
    pub retry: RetryConfig,
    pub log_enabled: bool,
    /// How many locales `translate_all` runs at once
    pub max_parallel_locales: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            google: GoogleConfig::default(),
            source_locale: "en".to_string(),
            target_locales: Vec::new(),
            lang_path: PathBuf::from("resources/lang"),
            batch_size: 100,
            preserve_patterns: vec![
                r":\w+".to_string(),
                r"\{\w+\}".to_string(),
                r"\[\w+\]".to_string(),
                r"@\w+".to_string(),
                r"#\w+".to_string(),
            ],
            skip_keys: vec![
                "validation.attributes".to_string(),
                "validation.custom".to_string(),
            ],
            rate_limit_delay_ms: 100,
            retry: RetryConfig::default(),
            log_enabled: true,
            max_parallel_locales: 1,
        }
    }
}

impl TranslationConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`]
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error. Environment overrides are applied on top.
    pub fn load(path: Option<&Path>) -> SyncResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        Self::from_toml(&content).map_err(|e| match e {
            SyncError::Configuration(msg) => SyncError::parse(path, msg),
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> SyncResult<Self> {
        toml::from_str(content).map_err(|e| SyncError::Configuration(e.to_string()))
    }

    /// Apply `AUTO_TRANSLATION_*` / `GOOGLE_TRANSLATE_API_KEY` overrides
    ///
    /// `lookup` returns the value of an environment variable, if set.
    pub fn apply_env<F>(&mut self, lookup: F) -> SyncResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(driver) = lookup("AUTO_TRANSLATION_DRIVER") {
            self.provider = driver.parse()?;
        }
        if let Some(key) = lookup("GOOGLE_TRANSLATE_API_KEY") {
            self.google.api_key = Some(key);
        }
        if let Some(source) = lookup("AUTO_TRANSLATION_SOURCE") {
            self.source_locale = source;
        }
        if let Some(flag) = lookup("AUTO_TRANSLATION_LOG") {
            self.log_enabled = parse_flag(&flag).ok_or_else(|| {
                SyncError::Configuration(format!("AUTO_TRANSLATION_LOG: not a boolean: '{}'", flag))
            })?;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> SyncResult<()> {
        if self.source_locale.trim().is_empty() {
            return Err(SyncError::Configuration(
                "source_locale cannot be empty".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(SyncError::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.retry.attempts == 0 {
            return Err(SyncError::Configuration(
                "retry.attempts must be at least 1".to_string(),
            ));
        }
        if self.max_parallel_locales == 0 {
            return Err(SyncError::Configuration(
                "max_parallel_locales must be at least 1".to_string(),
            ));
        }
        PlaceholderGuard::new(&self.preserve_patterns)?;
        Ok(())
    }

    /// Whether the selected provider has what it needs to run
    pub fn is_provider_configured(&self) -> bool {
        match self.provider {
            ProviderKind::Google => self
                .google
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty()),
            ProviderKind::Mock => true,
        }
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    /// Target locales for `translate_all`, without the source locale or duplicates
    ///
    /// Codes are compared after normalization, so `EN` is the source `en`
    /// and `pt_BR` duplicates `pt-BR`. The first spelling wins.
    pub fn active_target_locales(&self) -> Vec<String> {
        let source = normalize_locale(&self.source_locale);
        let mut seen = vec![source];
        let mut locales = Vec::new();
        for locale in &self.target_locales {
            let normalized = normalize_locale(locale);
            if !seen.contains(&normalized) {
                seen.push(normalized);
                locales.push(locale.clone());
            }
        }
        locales
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
