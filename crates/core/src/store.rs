//! Key-value storage.
//!
//! The service keeps all state in a flat key-value store: suggestion arrays per issue, quality
//! reports per issue, the admin settings and the usage counter. [`KeyValueStore`] is the seam;
//! [`FileStore`] persists to disk and [`MemoryStore`] backs tests and dry runs.
//!
//! Writes are atomic per key and nothing more. Two concurrent writers of the same key race and
//! the last one wins.

use crate::constants::{
    APP_CONFIG_KEY, DEFAULT_PAGE_LIMIT, KV_DIR_NAME, MAX_PAGE_LIMIT, QUALITY_KEY_PREFIX,
    SUGGESTIONS_KEY_PREFIX, USAGE_STATS_KEY,
};
use crate::error::{SuggestionError, SuggestionResult};
use crate::settings::AppSettings;
use crate::stats::UsageStats;
use crate::suggestion::Suggestion;
use drjira_types::IssueKey;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One stored entry as returned by [`KeyValueStore::query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub key: String,
    pub value: Value,
}

/// A page of stored entries in lexicographic key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePage {
    pub results: Vec<StorageEntry>,
    /// Pass back as `cursor` to fetch the next page. Absent on the last page.
    pub next_cursor: Option<String>,
}

/// Flat JSON key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> SuggestionResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &Value) -> SuggestionResult<()>;

    /// Lists entries with keys strictly after `cursor`, at most `limit` of them.
    fn query(&self, cursor: Option<&str>, limit: usize) -> SuggestionResult<StoragePage>;
}

/// Clamps a requested page size to `1..=MAX_PAGE_LIMIT`, defaulting when absent.
pub fn page_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT)
}

fn paginate(
    mut keys: Vec<String>,
    cursor: Option<&str>,
    limit: usize,
    mut load: impl FnMut(&str) -> SuggestionResult<Option<Value>>,
) -> SuggestionResult<StoragePage> {
    keys.sort();
    let remaining: Vec<String> = keys
        .into_iter()
        .filter(|key| cursor.map_or(true, |cursor| key.as_str() > cursor))
        .collect();

    let has_more = remaining.len() > limit;
    let mut results = Vec::with_capacity(limit.min(remaining.len()));
    for key in remaining.into_iter().take(limit) {
        if let Some(value) = load(&key)? {
            results.push(StorageEntry { key, value });
        }
    }

    let next_cursor = if has_more {
        results.last().map(|entry| entry.key.clone())
    } else {
        None
    };
    Ok(StoragePage {
        results,
        next_cursor,
    })
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> SuggestionResult<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> SuggestionResult<()> {
        self.entries.write().insert(key.to_owned(), value.clone());
        Ok(())
    }

    fn query(&self, cursor: Option<&str>, limit: usize) -> SuggestionResult<StoragePage> {
        let entries = self.entries.read();
        let keys = entries.keys().cloned().collect();
        paginate(keys, cursor, limit, |key| Ok(entries.get(key).cloned()))
    }
}

/// Store keeping one JSON file per key under `<data_dir>/kv/`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) the store under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SuggestionError::StorageDirCreation` if the directory cannot be created.
    pub fn open(data_dir: &Path) -> SuggestionResult<Self> {
        let root = data_dir.join(KV_DIR_NAME);
        fs::create_dir_all(&root).map_err(SuggestionError::StorageDirCreation)?;
        Ok(Self { root })
    }

    fn entry_path(&self, key: &str) -> SuggestionResult<PathBuf> {
        validate_storage_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

/// Storage keys become file names, so only `[A-Za-z0-9._-]` is accepted and `.`/`..` are not.
fn validate_storage_key(key: &str) -> SuggestionResult<()> {
    let ok = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
    if ok {
        Ok(())
    } else {
        Err(SuggestionError::InvalidStorageKey(key.to_owned()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> SuggestionResult<Option<Value>> {
        let path = self.entry_path(key)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SuggestionError::StorageRead(e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(SuggestionError::Deserialization)
    }

    fn set(&self, key: &str, value: &Value) -> SuggestionResult<()> {
        let path = self.entry_path(key)?;
        let contents = serde_json::to_vec_pretty(value).map_err(SuggestionError::Serialization)?;

        // One temp file per write, renamed over the entry: concurrent writers never share a
        // temp file and readers never see a half-written entry.
        let mut tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(SuggestionError::StorageWrite)?;
        tmp.write_all(&contents)
            .map_err(SuggestionError::StorageWrite)?;
        tmp.persist(&path)
            .map(|_| ())
            .map_err(|e| SuggestionError::StorageWrite(e.error))
    }

    fn query(&self, cursor: Option<&str>, limit: usize) -> SuggestionResult<StoragePage> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(SuggestionError::StorageRead)? {
            let entry = entry.map_err(SuggestionError::StorageRead)?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_owned());
            }
        }
        paginate(keys, cursor, limit, |key| self.get(key))
    }
}

/// Typed access to the entries the service owns.
#[derive(Clone)]
pub struct SuggestionStore {
    inner: Arc<dyn KeyValueStore>,
}

impl SuggestionStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// The underlying raw store.
    pub fn raw(&self) -> &dyn KeyValueStore {
        self.inner.as_ref()
    }

    /// Suggestions stored for `issue_key`, or `None` if nothing was ever stored.
    pub fn get(&self, issue_key: &IssueKey) -> SuggestionResult<Option<Vec<Suggestion>>> {
        self.get_typed(&format!("{SUGGESTIONS_KEY_PREFIX}{issue_key}"))
    }

    /// Replaces the suggestions stored for `issue_key`.
    pub fn set(&self, issue_key: &IssueKey, suggestions: &[Suggestion]) -> SuggestionResult<()> {
        self.set_typed(&format!("{SUGGESTIONS_KEY_PREFIX}{issue_key}"), suggestions)
    }

    pub fn quality(&self, issue_key: &IssueKey) -> SuggestionResult<Option<Value>> {
        self.inner.get(&format!("{QUALITY_KEY_PREFIX}{issue_key}"))
    }

    pub fn set_quality(&self, issue_key: &IssueKey, report: &Value) -> SuggestionResult<()> {
        self.inner
            .set(&format!("{QUALITY_KEY_PREFIX}{issue_key}"), report)
    }

    /// Stored admin settings, or the defaults.
    pub fn settings(&self) -> SuggestionResult<AppSettings> {
        Ok(self.get_typed(APP_CONFIG_KEY)?.unwrap_or_default())
    }

    pub fn set_settings(&self, settings: &AppSettings) -> SuggestionResult<()> {
        self.set_typed(APP_CONFIG_KEY, settings)
    }

    /// Stored usage counter, or an empty one.
    pub fn usage_stats(&self) -> SuggestionResult<UsageStats> {
        Ok(self.get_typed(USAGE_STATS_KEY)?.unwrap_or_default())
    }

    pub fn set_usage_stats(&self, stats: &UsageStats) -> SuggestionResult<()> {
        self.set_typed(USAGE_STATS_KEY, stats)
    }

    fn get_typed<T: serde::de::DeserializeOwned>(&self, key: &str) -> SuggestionResult<Option<T>> {
        match self.inner.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(SuggestionError::Deserialization),
            None => Ok(None),
        }
    }

    fn set_typed<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SuggestionResult<()> {
        let value = serde_json::to_value(value).map_err(SuggestionError::Serialization)?;
        self.inner.set(key, &value)
    }
}
