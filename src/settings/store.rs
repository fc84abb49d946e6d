//! Settings store implementations.
//!
//! Every `set`/`remove` is an individual durable write. There is no
//! transaction spanning several keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MonitorkitError, Result};

/// Get/set access to persisted installation settings.
pub trait SettingsStore {
    /// Read a value, `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a key entirely.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Every key currently written, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// On-disk layout of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsDocument {
    /// Schema version for migration.
    version: u32,

    /// Time of the last write.
    updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// Settings persisted in a YAML file, written through on every change.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    document: SettingsDocument,
}

impl FileSettingsStore {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        let document = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| Self::error(path, e))?;
            serde_yaml::from_str(&content).map_err(|e| Self::error(path, e))?
        } else {
            SettingsDocument {
                version: Self::CURRENT_VERSION,
                ..Default::default()
            }
        };

        tracing::debug!(
            "Loaded {} settings from {}",
            document.values.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the last persisted write.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.document.updated_at
    }

    /// Save to disk using write-to-temp-then-rename.
    fn save(&mut self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| Self::error(&self.path, e))?;
        }

        self.document.version = Self::CURRENT_VERSION;
        self.document.updated_at = Some(Utc::now());

        let content =
            serde_yaml::to_string(&self.document).map_err(|e| Self::error(&self.path, e))?;

        let temp_path = self.path.with_extension("yml.tmp");
        fs::write(&temp_path, &content).map_err(|e| Self::error(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| Self::error(&self.path, e))?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    fn error(path: &Path, err: impl std::fmt::Display) -> MonitorkitError {
        MonitorkitError::SettingsError {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.document.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.document
            .values
            .insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.document.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.document.values.keys().cloned().collect())
    }
}

/// In-memory settings, used by tests and dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySettingsStore {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemorySettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with values.
    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            writes: 0,
        }
    }

    /// Number of `set`/`remove` calls seen so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Borrow the raw values.
    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.writes += 1;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.writes += 1;
        self.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_starts_empty_when_missing() {
        let temp = TempDir::new().unwrap();
        let store = FileSettingsStore::open(&temp.path().join("settings.yml")).unwrap();

        assert_eq!(store.get("license_key").unwrap(), None);
        assert!(store.updated_at().is_none());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("settings.yml");

        let mut store = FileSettingsStore::open(&path).unwrap();
        store.set("apm", "true").unwrap();
        store.set("server_name", "web01").unwrap();

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("apm").unwrap().as_deref(), Some("true"));
        assert_eq!(
            reopened.get("server_name").unwrap().as_deref(),
            Some("web01")
        );
        assert!(reopened.updated_at().is_some());
    }

    #[test]
    fn file_store_remove_deletes_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yml");

        let mut store = FileSettingsStore::open(&path).unwrap();
        store.set("php_versions_81", "true").unwrap();
        store.remove("php_versions_81").unwrap();

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("php_versions_81").unwrap(), None);
    }

    #[test]
    fn file_store_lists_keys_sorted() {
        let temp = TempDir::new().unwrap();
        let mut store = FileSettingsStore::open(&temp.path().join("settings.yml")).unwrap();
        store.set("php_versions_82", "true").unwrap();
        store.set("apm", "true").unwrap();

        assert_eq!(store.keys().unwrap(), ["apm", "php_versions_82"]);
    }

    #[test]
    fn file_store_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yml");

        let mut store = FileSettingsStore::open(&path).unwrap();
        store.set("apm", "true").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("yml.tmp").exists());
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yml");
        fs::write(&path, "values: [not, a, map").unwrap();

        let err = FileSettingsStore::open(&path).unwrap_err();
        assert!(matches!(err, MonitorkitError::SettingsError { .. }));
    }

    #[test]
    fn memory_store_counts_writes() {
        let mut store = MemorySettingsStore::with_values([("apm", "1")]);
        assert_eq!(store.get("apm").unwrap().as_deref(), Some("1"));
        assert_eq!(store.write_count(), 0);

        store.set("infrastructure", "true").unwrap();
        store.remove("apm").unwrap();

        assert_eq!(store.write_count(), 2);
        assert_eq!(store.get("apm").unwrap(), None);
        assert_eq!(store.keys().unwrap(), ["infrastructure"]);
    }
}
