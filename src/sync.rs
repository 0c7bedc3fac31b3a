//! Resource synchronizer
//!
//! Top-level driver: for each resource of the source locale, load the source
//! and the existing target, run the batch translator, and write the merged
//! result back. Files are processed one after another; a failing file is
//! reported and never stops its siblings.
//!
//! # Example
//!
//! ```ignore
//! let config = Arc::new(TranslationConfig::load(None)?);
//! let provider = Arc::new(GoogleTranslateProvider::new(api_key)?);
//! let store = FileStore::new(&config.lang_path);
//! let sync = ResourceSynchronizer::new(config, provider, store)?;
//!
//! let report = sync.translate("fr", false, &CancellationToken::new()).await?;
//! println!("{} translated", report.stats.translated);
//! ```

use crate::batch::BatchTranslator;
use crate::config::TranslationConfig;
use crate::error::{SyncError, SyncResult};
use crate::mt::{MachineTranslator, normalize_locale, validate_locale};
use crate::stats::{FileStatus, LocaleReport, RunSummary, TranslationStats};
use crate::storage::{APP_DIR, ResourceFormat, ResourceId, ResourceStore};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Translates every resource of a locale and persists the results
pub struct ResourceSynchronizer<S> {
    translator: BatchTranslator,
    store: S,
}

impl<S: ResourceStore> ResourceSynchronizer<S> {
    pub fn new(
        config: Arc<TranslationConfig>,
        provider: Arc<dyn MachineTranslator>,
        store: S,
    ) -> SyncResult<Self> {
        Ok(Self {
            translator: BatchTranslator::new(config, provider)?,
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn translator(&self) -> &BatchTranslator {
        &self.translator
    }

    fn config(&self) -> &TranslationConfig {
        self.translator.config()
    }

    /// Reject target locales the pipeline must never write
    ///
    /// The source locale itself is a configuration error in any spelling
    /// (`EN`, `en_us` vs `en-US`), as is anything that is not a plain locale
    /// code (it ends up in file paths). The app directory name is reserved.
    pub fn check_target_locale(&self, target_locale: &str) -> SyncResult<()> {
        validate_locale(target_locale)
            .map_err(|e| SyncError::Configuration(e.to_string()))?;

        if normalize_locale(target_locale) == normalize_locale(&self.config().source_locale) {
            return Err(SyncError::Configuration(format!(
                "Cannot translate source language '{}' to itself",
                target_locale
            )));
        }
        if target_locale.eq_ignore_ascii_case(APP_DIR) {
            return Err(SyncError::Configuration(format!(
                "'{}' is reserved for the app translation files",
                target_locale
            )));
        }
        Ok(())
    }

    /// Translate every resource of the source locale into `target_locale`
    ///
    /// # Returns
    ///
    /// * `Ok(LocaleReport)` - Per-file outcomes and the locale rollup
    /// * `Err(SyncError::Configuration)` - If the target locale is invalid
    ///   or equal to the source locale
    pub async fn translate(
        &self,
        target_locale: &str,
        force: bool,
        cancel: &CancellationToken,
    ) -> SyncResult<LocaleReport> {
        self.check_target_locale(target_locale)?;

        let source_locale = &self.config().source_locale;
        let resources = self.store.list(source_locale)?;
        if resources.is_empty() {
            warn!("No resources found for source language '{}'", source_locale);
        }

        Ok(self
            .sync_resource_set(target_locale, &resources, force, cancel)
            .await)
    }

    /// Translate `target_locales` from configuration
    ///
    /// Up to `max_parallel_locales` locales run at once; reports come back in
    /// configuration order. A locale that cannot run is logged and reported
    /// with no files.
    pub async fn translate_all(&self, force: bool, cancel: &CancellationToken) -> RunSummary {
        let locales = self.config().active_target_locales();
        let mut summary = RunSummary::default();

        if locales.is_empty() {
            warn!("No target languages configured to translate");
            return summary;
        }

        info!("Translating {} language(s)", locales.len());

        let reports: Vec<LocaleReport> = futures::stream::iter(locales)
            .map(move |locale| async move {
                match self.translate(&locale, force, cancel).await {
                    Ok(report) => report,
                    Err(e) => {
                        error!("Translation failed for {}: {}", locale, e);
                        LocaleReport::new(locale)
                    }
                }
            })
            .buffered(self.config().max_parallel_locales.max(1))
            .collect()
            .await;

        for report in reports {
            summary.push(report);
        }
        summary
    }

    /// Translate the given resources into `target_locale`, one file at a time
    ///
    /// Each file's counters are rolled into the locale total. Once `cancel`
    /// fires, the file in progress and all remaining files are reported as
    /// cancelled and left unwritten.
    pub async fn sync_resource_set(
        &self,
        target_locale: &str,
        resources: &[ResourceId],
        force: bool,
        cancel: &CancellationToken,
    ) -> LocaleReport {
        let mut report = LocaleReport::new(target_locale);
        info!("Starting translation to {}", target_locale);

        for id in resources {
            let name = id.display_name();

            if cancel.is_cancelled() {
                report.record(name, TranslationStats::default(), FileStatus::Cancelled);
                continue;
            }

            match self.sync_resource(target_locale, id, force, cancel).await {
                Ok(stats) => {
                    info!(
                        "Translated file: {} ({}/{})",
                        name, stats.translated, stats.total
                    );
                    report.record(name, stats, FileStatus::Written);
                }
                Err(SyncError::ResourceNotFound(what)) => {
                    warn!("Source resource does not exist: {}", what);
                    report.record(name, TranslationStats::default(), FileStatus::SourceMissing);
                }
                Err(SyncError::Cancelled) => {
                    warn!("Translation of {} to {} cancelled", name, target_locale);
                    report.record(name, TranslationStats::default(), FileStatus::Cancelled);
                }
                Err(e) => {
                    error!("Failed to translate file {}: {}", name, e);
                    report.record(
                        name,
                        TranslationStats::default(),
                        FileStatus::Failed(e.to_string()),
                    );
                }
            }
        }

        let stats = report.stats;
        info!(
            "Translation completed for {}. Total: {}, Translated: {}, Skipped: {}, Errors: {}",
            target_locale, stats.total, stats.translated, stats.skipped, stats.errors
        );
        report
    }

    /// Load, translate and persist one resource
    ///
    /// Nothing is written unless the whole file was processed.
    async fn sync_resource(
        &self,
        target_locale: &str,
        id: &ResourceId,
        force: bool,
        cancel: &CancellationToken,
    ) -> SyncResult<TranslationStats> {
        let source_locale = &self.config().source_locale;
        let source = self.store.load(source_locale, id)?.ok_or_else(|| {
            SyncError::ResourceNotFound(format!("{} ({})", id, source_locale))
        })?;
        let existing = self.store.load(target_locale, id)?.unwrap_or_default();

        let (merged, stats) = match id.format() {
            ResourceFormat::Nested => {
                self.translator
                    .run_in(id.scope(), &source, &existing, target_locale, force, cancel)
                    .await?
            }
            ResourceFormat::Flat => {
                self.translator
                    .run_entries(&source, &existing, target_locale, force, cancel)
                    .await?
            }
        };

        self.store.save(target_locale, id, &merged)?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::mt::{MockMode, MockTranslator};
    use crate::storage::MemoryStore;
    use crate::tree::ResourceTree;
    use serde_json::json;

    fn test_config() -> TranslationConfig {
        TranslationConfig {
            rate_limit_delay_ms: 0,
            retry: RetryConfig {
                attempts: 2,
                delay_ms: 0,
            },
            ..Default::default()
        }
    }

    fn tree(value: serde_json::Value) -> ResourceTree {
        ResourceTree::from_json(value).unwrap()
    }

    fn synchronizer(
        config: TranslationConfig,
        store: MemoryStore,
    ) -> ResourceSynchronizer<MemoryStore> {
        ResourceSynchronizer::new(
            Arc::new(config),
            Arc::new(MockTranslator::new(MockMode::Suffix)),
            store,
        )
        .unwrap()
    }

    // ========== Locale Validation Tests ==========

    #[tokio::test]
    async fn test_source_locale_rejected() {
        let sync = synchronizer(test_config(), MemoryStore::new());
        let result = sync.translate("en", false, &CancellationToken::new()).await;
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_path_like_locale_rejected() {
        let sync = synchronizer(test_config(), MemoryStore::new());
        let result = sync.translate("../fr", false, &CancellationToken::new()).await;
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_source_locale_rejected_in_any_spelling() {
        let config = TranslationConfig {
            source_locale: "en_US".to_string(),
            ..test_config()
        };
        let sync = synchronizer(config, MemoryStore::new());
        for locale in ["en-us", "EN_US", "en-US"] {
            let result = sync.translate(locale, false, &CancellationToken::new()).await;
            assert!(
                matches!(result, Err(SyncError::Configuration(_))),
                "{} should be rejected",
                locale
            );
        }
        assert!(sync.check_target_locale("en").is_ok());
    }

    #[tokio::test]
    async fn test_app_directory_is_not_a_locale() {
        let store = MemoryStore::new().with_resource(
            "en",
            ResourceId::App,
            tree(json!({"hello": "Hello"})),
        );
        let sync = synchronizer(test_config(), store);

        for locale in ["app", "APP"] {
            let result = sync.translate(locale, false, &CancellationToken::new()).await;
            assert!(matches!(result, Err(SyncError::Configuration(_))));
        }
        assert!(sync.store().get("app", &ResourceId::App).is_none());
    }

    // ========== File Handling Tests ==========

    #[tokio::test]
    async fn test_nested_and_flat_resources() {
        let store = MemoryStore::new()
            .with_resource(
                "en",
                ResourceId::group("auth"),
                tree(json!({"failed": "Wrong credentials", "throttle": {"short": "Slow down"}})),
            )
            .with_resource(
                "en",
                ResourceId::App,
                tree(json!({"Welcome back.": "Welcome back."})),
            );
        let sync = synchronizer(test_config(), store);

        let report = sync
            .translate("fr", false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            sync.store().get("fr", &ResourceId::group("auth")).unwrap().into_json(),
            json!({"failed": "Wrong credentials_fr", "throttle": {"short": "Slow down_fr"}})
        );
        assert_eq!(
            sync.store().get("fr", &ResourceId::App).unwrap().into_json(),
            json!({"Welcome back.": "Welcome back._fr"})
        );
        assert_eq!(report.stats.total, 3);
        assert_eq!(report.stats.translated, 3);
        let names: Vec<&String> = report.files.keys().collect();
        assert_eq!(names, vec!["auth.json", "app"]);
    }

    #[tokio::test]
    async fn test_missing_source_contributes_nothing() {
        let store = MemoryStore::new().with_resource(
            "en",
            ResourceId::group("auth"),
            tree(json!({"a": "A"})),
        );
        let sync = synchronizer(test_config(), store);

        let report = sync
            .sync_resource_set(
                "fr",
                &[ResourceId::group("missing"), ResourceId::group("auth")],
                false,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.files["missing.json"].status, FileStatus::SourceMissing);
        assert_eq!(report.files["auth.json"].status, FileStatus::Written);
        assert_eq!(report.stats.total, 1);
        assert!(sync.store().get("fr", &ResourceId::group("missing")).is_none());
    }

    #[tokio::test]
    async fn test_structural_conflict_fails_only_that_file() {
        let store = MemoryStore::new()
            .with_resource(
                "en",
                ResourceId::group("broken"),
                tree(json!({"a": "leaf", "a.b": "child"})),
            )
            .with_resource("en", ResourceId::group("ok"), tree(json!({"x": "X"})));
        let sync = synchronizer(test_config(), store);

        let report = sync
            .translate("fr", false, &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(report.files["broken.json"].status, FileStatus::Failed(_)));
        assert_eq!(report.files["broken.json"].stats, TranslationStats::default());
        assert_eq!(report.files["ok.json"].status, FileStatus::Written);
        assert!(sync.store().get("fr", &ResourceId::group("broken")).is_none());
        assert!(report.has_output());
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let store = MemoryStore::new()
            .with_resource("en", ResourceId::group("auth"), tree(json!({"a": "A"})))
            .with_resource("en", ResourceId::App, tree(json!({"b": "B"})));
        let sync = synchronizer(test_config(), store);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = sync.translate("fr", false, &cancel).await.unwrap();

        assert!(report.was_cancelled());
        assert!(!report.has_output());
        assert!(sync.store().get("fr", &ResourceId::group("auth")).is_none());
        assert!(sync.store().get("fr", &ResourceId::App).is_none());
    }

    // ========== Translate All Tests ==========

    #[tokio::test]
    async fn test_translate_all_skips_source_and_keeps_order() {
        let store = MemoryStore::new().with_resource(
            "en",
            ResourceId::App,
            tree(json!({"hello": "Hello"})),
        );
        let config = TranslationConfig {
            target_locales: vec!["fr".into(), "en".into(), "es".into()],
            max_parallel_locales: 2,
            ..test_config()
        };
        let sync = synchronizer(config, store);

        let summary = sync.translate_all(false, &CancellationToken::new()).await;

        let locales: Vec<&str> = summary.locales.iter().map(|r| r.locale.as_str()).collect();
        assert_eq!(locales, vec!["fr", "es"]);
        assert_eq!(summary.stats.translated, 2);
        assert_eq!(
            sync.store().get("es", &ResourceId::App).unwrap().into_json(),
            json!({"hello": "Hello_es"})
        );
    }

    #[tokio::test]
    async fn test_translate_all_invalid_locale_does_not_stop_others() {
        let store = MemoryStore::new().with_resource(
            "en",
            ResourceId::App,
            tree(json!({"hello": "Hello"})),
        );
        let config = TranslationConfig {
            target_locales: vec!["bad/locale".into(), "fr".into()],
            ..test_config()
        };
        let sync = synchronizer(config, store);

        let summary = sync.translate_all(false, &CancellationToken::new()).await;

        assert_eq!(summary.locales.len(), 2);
        assert!(summary.locales[0].files.is_empty());
        assert!(summary.locales[1].has_output());
    }

    #[tokio::test]
    async fn test_translate_all_without_targets_is_empty() {
        let sync = synchronizer(test_config(), MemoryStore::new());
        let summary = sync.translate_all(false, &CancellationToken::new()).await;
        assert!(summary.locales.is_empty());
        assert!(!summary.has_output());
    }
}
