//! Batch translator
//!
//! Walks a flattened source resource, decides per key whether to keep what
//! is there or to translate, sends the work to the provider in fixed-size
//! batches with placeholder protection, and merges the results back in
//! source key order.
//!
//! Per key, in order:
//! 1. non-string leaf → copied verbatim, skipped
//! 2. path starts with a skip prefix → copied verbatim, skipped (even when forced)
//! 3. not forced and the target already has a non-empty value → target kept, skipped
//! 4. otherwise → queued for translation
//!
//! A batch is retried as a whole; when every attempt fails its units fall
//! back to their source text and count as errors, so no key is ever left
//! unset.

use crate::config::TranslationConfig;
use crate::error::{SyncError, SyncResult};
use crate::guard::{MaskedText, PlaceholderGuard};
use crate::mt::{MachineTranslator, MtError};
use crate::stats::TranslationStats;
use crate::tree::{
    FlatMap, PATH_SEPARATOR, ResourceNode, ResourceTree, flatten, flatten_entries, unflatten,
    unflatten_entries,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Key-path prefixes that are never translated
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    prefixes: Vec<String>,
}

impl SkipRules {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Plain string-prefix match on the dotted path
    pub fn matches(&self, key: &str) -> bool {
        self.prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
    }

    /// Match `key` as it appears under `scope`
    pub fn matches_in(&self, scope: Option<&str>, key: &str) -> bool {
        match scope {
            Some(scope) => self.matches(&format!("{}{}{}", scope, PATH_SEPARATOR, key)),
            None => self.matches(key),
        }
    }
}

/// Result of one provider call for a whole batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// One translation per input, in input order
    Success(Vec<String>),
    Failure(MtError),
}

/// A key selected for translation, with its masked text
#[derive(Debug, Clone)]
struct TranslationUnit {
    key: String,
    source: String,
    masked: MaskedText,
}

/// Drives the provider over a resource, one batch at a time
pub struct BatchTranslator {
    config: Arc<TranslationConfig>,
    guard: PlaceholderGuard,
    skip_rules: SkipRules,
    provider: Arc<dyn MachineTranslator>,
}

impl std::fmt::Debug for BatchTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchTranslator")
            .field("provider", &self.provider.provider_name())
            .field("batch_size", &self.config.batch_size)
            .field("skip_rules", &self.skip_rules)
            .finish()
    }
}

impl BatchTranslator {
    /// Build a translator from validated configuration
    ///
    /// # Returns
    ///
    /// * `Err(SyncError::Configuration)` - If the settings fail validation
    pub fn new(
        config: Arc<TranslationConfig>,
        provider: Arc<dyn MachineTranslator>,
    ) -> SyncResult<Self> {
        config.validate()?;
        let guard = PlaceholderGuard::new(&config.preserve_patterns)?;
        let skip_rules = SkipRules::new(config.skip_keys.iter().cloned());

        Ok(Self {
            config,
            guard,
            skip_rules,
            provider,
        })
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn MachineTranslator {
        self.provider.as_ref()
    }

    /// Translate a nested resource against an existing target
    ///
    /// # Returns
    ///
    /// * `Ok((tree, stats))` - The merged tree in source key order
    /// * `Err(SyncError::StructuralConflict)` - If the merged paths cannot be rebuilt
    /// * `Err(SyncError::Cancelled)` - If `cancel` fired between batches
    pub async fn run(
        &self,
        source: &ResourceTree,
        existing: &ResourceTree,
        target_locale: &str,
        force: bool,
        cancel: &CancellationToken,
    ) -> SyncResult<(ResourceTree, TranslationStats)> {
        self.run_in(None, source, existing, target_locale, force, cancel)
            .await
    }

    /// [`BatchTranslator::run`] for a resource living under `scope`
    ///
    /// Skip prefixes are matched against `{scope}.{path}`, so a group file
    /// named `validation` honours a `validation.attributes` rule.
    pub async fn run_in(
        &self,
        scope: Option<&str>,
        source: &ResourceTree,
        existing: &ResourceTree,
        target_locale: &str,
        force: bool,
        cancel: &CancellationToken,
    ) -> SyncResult<(ResourceTree, TranslationStats)> {
        let (merged, stats) = self
            .translate_entries(
                scope,
                &flatten(source),
                &flatten(existing),
                target_locale,
                force,
                cancel,
            )
            .await?;
        Ok((unflatten(merged)?, stats))
    }

    /// Translate a resource whose top-level keys are opaque strings
    ///
    /// Top-level keys may contain the path separator and are matched against
    /// skip prefixes as written. Objects below them are translated leaf by
    /// leaf like any nested resource.
    pub async fn run_entries(
        &self,
        source: &ResourceTree,
        existing: &ResourceTree,
        target_locale: &str,
        force: bool,
        cancel: &CancellationToken,
    ) -> SyncResult<(ResourceTree, TranslationStats)> {
        let (source_entries, layout) = flatten_entries(source)?;
        let (existing_entries, _) = flatten_entries(existing)?;
        let (merged, stats) = self
            .translate_entries(
                None,
                &source_entries,
                &existing_entries,
                target_locale,
                force,
                cancel,
            )
            .await?;
        Ok((unflatten_entries(merged, &layout)?, stats))
    }

    async fn translate_entries(
        &self,
        scope: Option<&str>,
        source: &FlatMap,
        existing: &FlatMap,
        target_locale: &str,
        force: bool,
        cancel: &CancellationToken,
    ) -> SyncResult<(FlatMap, TranslationStats)> {
        let mut stats = TranslationStats::default();
        let mut merged = FlatMap::with_capacity(source.len());
        let mut queue = Vec::new();

        for (key, node) in source {
            stats.total += 1;

            let Some(text) = node.as_text() else {
                merged.insert(key.clone(), node.clone());
                stats.skipped += 1;
                continue;
            };

            if self.skip_rules.matches_in(scope, key) {
                merged.insert(key.clone(), node.clone());
                stats.skipped += 1;
                continue;
            }

            if !force && let Some(current) = existing.get(key).filter(|n| n.is_filled()) {
                merged.insert(key.clone(), current.clone());
                stats.skipped += 1;
                continue;
            }

            // Reserve the slot so the merged map keeps source key order.
            merged.insert(key.clone(), node.clone());
            queue.push(TranslationUnit {
                key: key.clone(),
                source: text.to_string(),
                masked: self.guard.mask(text),
            });
        }

        let batch_count = queue.len().div_ceil(self.config.batch_size);
        for (index, batch) in queue.chunks(self.config.batch_size).enumerate() {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            debug!(
                "Translating batch {}/{} ({} texts) to {}",
                index + 1,
                batch_count,
                batch.len(),
                target_locale
            );

            match self.translate_with_retry(batch, target_locale, cancel).await? {
                BatchOutcome::Success(translations) => {
                    for (unit, translated) in batch.iter().zip(translations) {
                        let placeholders = &unit.masked.placeholders;
                        let missing = PlaceholderGuard::missing_tokens(&translated, placeholders);
                        if !missing.is_empty() {
                            warn!(
                                key = %unit.key,
                                locale = target_locale,
                                "Provider dropped placeholder tokens {:?}",
                                missing
                            );
                        }
                        let restored = PlaceholderGuard::unmask(&translated, placeholders);
                        merged.insert(unit.key.clone(), ResourceNode::text(restored));
                        stats.translated += 1;
                    }
                    pause(self.config.rate_limit_delay(), cancel).await?;
                }
                BatchOutcome::Failure(err) => {
                    error!(
                        "Batch translation to {} failed, keeping source text for {} keys: {}",
                        target_locale,
                        batch.len(),
                        err
                    );
                    for unit in batch {
                        merged.insert(unit.key.clone(), ResourceNode::text(unit.source.clone()));
                        stats.errors += 1;
                    }
                }
            }
        }

        Ok((merged, stats))
    }

    /// One provider call for a batch, with the length check
    async fn attempt(&self, texts: &[String], target_locale: &str) -> BatchOutcome {
        match self
            .provider
            .translate_batch(texts, &self.config.source_locale, target_locale)
            .await
        {
            Ok(translations) if translations.len() == texts.len() => {
                BatchOutcome::Success(translations)
            }
            Ok(translations) => BatchOutcome::Failure(MtError::LengthMismatch {
                expected: texts.len(),
                actual: translations.len(),
            }),
            Err(err) => BatchOutcome::Failure(err),
        }
    }

    /// Call the provider up to `retry.attempts` times with a fixed pause
    ///
    /// Only cancellation is an `Err`; provider failures come back as
    /// [`BatchOutcome::Failure`] after the last attempt.
    async fn translate_with_retry(
        &self,
        batch: &[TranslationUnit],
        target_locale: &str,
        cancel: &CancellationToken,
    ) -> SyncResult<BatchOutcome> {
        let texts: Vec<String> = batch.iter().map(|unit| unit.masked.text.clone()).collect();
        let attempts = self.config.retry.attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.attempt(&texts, target_locale).await {
                BatchOutcome::Failure(err) if attempt < attempts => {
                    warn!(
                        "Attempt {}/{} via {} failed: {}; retrying in {:?}",
                        attempt,
                        attempts,
                        self.provider.provider_name(),
                        err,
                        self.config.retry.delay()
                    );
                    pause(self.config.retry.delay(), cancel).await?;
                    attempt += 1;
                }
                outcome => return Ok(outcome),
            }
        }
    }
}

/// Sleep unless cancelled first
async fn pause(duration: Duration, cancel: &CancellationToken) -> SyncResult<()> {
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
