//! Batch machine translation for hierarchical localization resources
//!
//! Source-locale resource files (nested JSON groups and a flat app file) are
//! flattened to dotted key paths, filtered, protected against placeholder
//! mangling, sent to a [`mt::MachineTranslator`] in fixed-size batches and
//! merged back with whatever the target locale already had.
//!
//! # Example
//!
//! ```ignore
//! use i18n_autotranslate::{FileStore, ResourceSynchronizer, TranslationConfig};
//! use i18n_autotranslate::mt::{MockMode, MockTranslator};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = Arc::new(TranslationConfig::default());
//! let store = FileStore::new(&config.lang_path);
//! let provider = Arc::new(MockTranslator::new(MockMode::Suffix));
//! let sync = ResourceSynchronizer::new(config, provider, store)?;
//!
//! let report = sync.translate("fr", false, &CancellationToken::new()).await?;
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod guard;
pub mod mt;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod tree;


pub use batch::{BatchOutcome, BatchTranslator, SkipRules};
pub use config::{ProviderKind, TranslationConfig};
pub use error::{SyncError, SyncResult};
pub use guard::{MaskedText, PlaceholderGuard};
pub use stats::{FileReport, FileStatus, LocaleReport, RunSummary, TranslationStats};
pub use storage::{FileStore, MemoryStore, ResourceFormat, ResourceId, ResourceStore};
pub use sync::ResourceSynchronizer;
pub use tree::{FlatMap, ResourceNode, ResourceTree, Scalar, flatten, unflatten};
