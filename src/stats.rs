//! Translation counters and the reports built from them.

use indexmap::IndexMap;
use serde::Serialize;
use std::ops::AddAssign;

/// Counters for one run of the batch translator
///
/// For a completed run `total == translated + skipped + errors`: units whose
/// batch exhausted its retries fall back to source text and count as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranslationStats {
    pub total: usize,
    pub translated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl TranslationStats {
    pub fn is_balanced(&self) -> bool {
        self.total == self.translated + self.skipped + self.errors
    }
}

impl AddAssign for TranslationStats {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.translated += other.translated;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// What happened to a single resource file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum FileStatus {
    /// Translated and written back
    Written,
    /// No source resource; nothing to do
    SourceMissing,
    /// Loading, rebuilding or saving failed; the target was left untouched
    Failed(String),
    /// The run was cancelled before this file completed; nothing was written
    Cancelled,
}

/// Per-file outcome and counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub stats: TranslationStats,
    pub status: FileStatus,
}

/// Per-locale rollup with a per-file breakdown in processing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleReport {
    pub locale: String,
    pub stats: TranslationStats,
    pub files: IndexMap<String, FileReport>,
}

impl LocaleReport {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            stats: TranslationStats::default(),
            files: IndexMap::new(),
        }
    }

    /// Record a file's outcome and roll its counters into the locale total
    pub fn record(&mut self, name: impl Into<String>, stats: TranslationStats, status: FileStatus) {
        self.stats += stats;
        self.files.insert(name.into(), FileReport { stats, status });
    }

    /// At least one file was written
    pub fn has_output(&self) -> bool {
        self.files
            .values()
            .any(|file| file.status == FileStatus::Written)
    }

    pub fn was_cancelled(&self) -> bool {
        self.files
            .values()
            .any(|file| file.status == FileStatus::Cancelled)
    }
}

/// Rollup across locales, in the order the locales were requested
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub stats: TranslationStats,
    pub locales: Vec<LocaleReport>,
}

impl RunSummary {
    pub fn push(&mut self, report: LocaleReport) {
        self.stats += report.stats;
        self.locales.push(report);
    }

    /// At least one locale produced a written file
    pub fn has_output(&self) -> bool {
        self.locales.iter().any(LocaleReport::has_output)
    }
}
