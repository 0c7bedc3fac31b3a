//! Resource storage.
//!
//! The synchronizer reads and writes resources through [`ResourceStore`];
//! [`FileStore`] is the JSON-on-disk implementation and [`MemoryStore`]
//! keeps everything in memory.
//!
//! File layout under the store root:
//!
//! ```text
//! resources/lang/
//! ├── en/
//! │   ├── auth.json         # group files, nested
//! │   └── validation.json
//! ├── fr/
//! │   └── auth.json
//! └── app/
//!     ├── en.json           # app file, flat key/value
//!     └── fr.json
//! ```

use crate::error::{SyncError, SyncResult};
use crate::tree::ResourceTree;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Directory holding the per-locale app files
pub(crate) const APP_DIR: &str = "app";
const EXTENSION: &str = "json";

/// How a resource's keys map onto the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    /// Nested tree, addressed by dotted paths
    Nested,
    /// Single-level key/value pairs; keys are taken verbatim
    Flat,
}

/// Identifies one resource independently of its locale
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    /// A named group file (`auth`, `validation`, ...)
    Group(String),
    /// The per-locale app file
    App,
}

impl ResourceId {
    pub fn group(name: impl Into<String>) -> Self {
        ResourceId::Group(name.into())
    }

    pub fn format(&self) -> ResourceFormat {
        match self {
            ResourceId::Group(_) => ResourceFormat::Nested,
            ResourceId::App => ResourceFormat::Flat,
        }
    }

    /// Prefix under which the resource's keys are addressed, if any
    pub fn scope(&self) -> Option<&str> {
        match self {
            ResourceId::Group(name) => Some(name.as_str()),
            ResourceId::App => None,
        }
    }

    /// Name used in reports
    pub fn display_name(&self) -> String {
        match self {
            ResourceId::Group(name) => format!("{}.{}", name, EXTENSION),
            ResourceId::App => APP_DIR.to_string(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Load and save resources by (locale, id)
pub trait ResourceStore: Send + Sync {
    /// Resources present for `locale`, group files first (by name), then the app file
    fn list(&self, locale: &str) -> SyncResult<Vec<ResourceId>>;

    /// `Ok(None)` when the resource does not exist
    fn load(&self, locale: &str, id: &ResourceId) -> SyncResult<Option<ResourceTree>>;

    /// Replace the resource in one step; a failed save leaves the old content intact
    fn save(&self, locale: &str, id: &ResourceId, tree: &ResourceTree) -> SyncResult<()>;
}

/// JSON files on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a resource for a locale
    pub fn path_for(&self, locale: &str, id: &ResourceId) -> PathBuf {
        match id {
            ResourceId::Group(name) => self
                .root
                .join(locale)
                .join(format!("{}.{}", name, EXTENSION)),
            ResourceId::App => self
                .root
                .join(APP_DIR)
                .join(format!("{}.{}", locale, EXTENSION)),
        }
    }

    fn list_groups(&self, locale: &str) -> SyncResult<Vec<ResourceId>> {
        let dir = self.root.join(locale);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| SyncError::io(&dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SyncError::io(&dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();

        Ok(names.into_iter().map(ResourceId::Group).collect())
    }
}

impl ResourceStore for FileStore {
    fn list(&self, locale: &str) -> SyncResult<Vec<ResourceId>> {
        let mut ids = self.list_groups(locale)?;
        if self.path_for(locale, &ResourceId::App).is_file() {
            ids.push(ResourceId::App);
        }
        Ok(ids)
    }

    fn load(&self, locale: &str, id: &ResourceId) -> SyncResult<Option<ResourceTree>> {
        let path = self.path_for(locale, id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::io(&path, e)),
        };

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| SyncError::parse(&path, e))?;
        let tree = ResourceTree::from_json(value).map_err(|msg| SyncError::parse(&path, msg))?;

        Ok(Some(tree))
    }

    fn save(&self, locale: &str, id: &ResourceId, tree: &ResourceTree) -> SyncResult<()> {
        let path = self.path_for(locale, id);
        let dir = path
            .parent()
            .ok_or_else(|| SyncError::parse(&path, "resource path has no parent directory"))?;
        fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;

        let mut content = serde_json::to_string_pretty(&tree.clone().into_json())
            .map_err(|e| SyncError::parse(&path, e))?;
        content.push('\n');

        // Write next to the target, then rename over it.
        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| SyncError::io(dir, e))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| SyncError::io(staged.path(), e))?;
        staged
            .persist(&path)
            .map_err(|e| SyncError::io(&path, e.error))?;

        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// In-memory store, keyed by (locale, id)
#[derive(Debug, Default)]
pub struct MemoryStore {
    resources: Mutex<HashMap<(String, ResourceId), ResourceTree>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(self, locale: &str, id: ResourceId, tree: ResourceTree) -> Self {
        self.insert(locale, id, tree);
        self
    }

    pub fn insert(&self, locale: &str, id: ResourceId, tree: ResourceTree) {
        self.lock().insert((locale.to_string(), id), tree);
    }

    pub fn get(&self, locale: &str, id: &ResourceId) -> Option<ResourceTree> {
        self.lock().get(&(locale.to_string(), id.clone())).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, ResourceId), ResourceTree>> {
        // A panic while holding the lock cannot leave a half-written tree behind.
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResourceStore for MemoryStore {
    fn list(&self, locale: &str) -> SyncResult<Vec<ResourceId>> {
        let mut ids: Vec<ResourceId> = self
            .lock()
            .keys()
            .filter(|(l, _)| l == locale)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn load(&self, locale: &str, id: &ResourceId) -> SyncResult<Option<ResourceTree>> {
        Ok(self.get(locale, id))
    }

    fn save(&self, locale: &str, id: &ResourceId, tree: &ResourceTree) -> SyncResult<()> {
        self.insert(locale, id.clone(), tree.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    // ========== Resource Id Tests ==========

    #[test]
    fn test_resource_id_formats() {
        assert_eq!(ResourceId::group("auth").format(), ResourceFormat::Nested);
        assert_eq!(ResourceId::App.format(), ResourceFormat::Flat);
        assert_eq!(ResourceId::group("auth").scope(), Some("auth"));
        assert_eq!(ResourceId::App.scope(), None);
        assert_eq!(ResourceId::group("auth").to_string(), "auth.json");
        assert_eq!(ResourceId::App.to_string(), "app");
    }

    #[test]
    fn test_groups_sort_before_app() {
        let mut ids = vec![ResourceId::App, ResourceId::group("b"), ResourceId::group("a")];
        ids.sort();
        assert_eq!(
            ids,
            vec![ResourceId::group("a"), ResourceId::group("b"), ResourceId::App]
        );
    }

    // ========== File Store Tests ==========

    #[test]
    fn test_path_layout() {
        let store = FileStore::new("/lang");
        assert_eq!(
            store.path_for("fr", &ResourceId::group("auth")),
            PathBuf::from("/lang/fr/auth.json")
        );
        assert_eq!(
            store.path_for("fr", &ResourceId::App),
            PathBuf::from("/lang/app/fr.json")
        );
    }

    #[test]
    fn test_list_sorted_groups_then_app() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("en/validation.json"), "{}");
        write(&dir.path().join("en/auth.json"), "{}");
        write(&dir.path().join("en/notes.txt"), "ignored");
        write(&dir.path().join("app/en.json"), "{}");

        let store = FileStore::new(dir.path());
        assert_eq!(
            store.list("en").unwrap(),
            vec![
                ResourceId::group("auth"),
                ResourceId::group("validation"),
                ResourceId::App
            ]
        );
    }

    #[test]
    fn test_list_missing_locale_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.list("en").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("fr", &ResourceId::group("auth")).unwrap().is_none());
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("en/auth.json"), "{ not json");
        let store = FileStore::new(dir.path());

        let result = store.load("en", &ResourceId::group("auth"));
        assert!(matches!(result, Err(SyncError::Parse { .. })));
    }

    #[test]
    fn test_load_non_object_root_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("en/auth.json"), "[1, 2]");
        let store = FileStore::new(dir.path());

        let result = store.load("en", &ResourceId::group("auth"));
        assert!(matches!(result, Err(SyncError::Parse { .. })));
    }

    #[test]
    fn test_save_creates_directory_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let tree = ResourceTree::from_json(json!({"z": "Zèbre", "a": {"b": "Bœuf"}})).unwrap();

        store.save("fr", &ResourceId::group("animals"), &tree).unwrap();

        let path = dir.path().join("fr/animals.json");
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("Zèbre"), "unicode must not be escaped");
        assert!(written.ends_with("}\n"));
        assert!(written.find("\"z\"").unwrap() < written.find("\"a\"").unwrap());
        assert_eq!(
            store.load("fr", &ResourceId::group("animals")).unwrap(),
            Some(tree)
        );
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("app/fr.json"), r#"{"old": "value"}"#);
        let store = FileStore::new(dir.path());
        let tree = ResourceTree::from_json(json!({"Welcome.": "Bienvenue."})).unwrap();

        store.save("fr", &ResourceId::App, &tree).unwrap();

        let reloaded = store.load("fr", &ResourceId::App).unwrap().unwrap();
        assert_eq!(reloaded.into_json(), json!({"Welcome.": "Bienvenue."}));
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("app")).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "no temporary files left behind");
    }

    // ========== Memory Store Tests ==========

    #[test]
    fn test_memory_store_round_trip() {
        let tree = ResourceTree::from_json(json!({"a": "b"})).unwrap();
        let store = MemoryStore::new().with_resource("en", ResourceId::App, tree.clone());

        assert_eq!(store.list("en").unwrap(), vec![ResourceId::App]);
        assert!(store.list("fr").unwrap().is_empty());
        assert_eq!(store.load("en", &ResourceId::App).unwrap(), Some(tree.clone()));

        store.save("fr", &ResourceId::App, &tree).unwrap();
        assert_eq!(store.get("fr", &ResourceId::App), Some(tree));
    }
}
