//! # Legacy key-value store
//!
//! Before the remote service existed every journal lived in a flat,
//! string-keyed text store. The store is still read by the migration agent
//! and written with freshness markers for anything polling it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{SyncError, SyncResult};

/// Prefix of every key holding a legacy journal blob.
pub const JOURNAL_KEY_PREFIX: &str = "journal_";

pub trait LegacyStore: Send + Sync {
    /// Keys in a stable order.
    fn keys(&self) -> SyncResult<Vec<String>>;
    fn get(&self, key: &str) -> SyncResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> SyncResult<()>;
    /// Removing a missing key is a no-op.
    fn remove(&self, key: &str) -> SyncResult<()>;
}

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> SyncResult<MutexGuard<'_, BTreeMap<String, String>>> {
    entries
        .lock()
        .map_err(|_| SyncError::Storage("legacy store lock poisoned".into()))
}

/// In-process store, used for embedding and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl LegacyStore for MemoryStore {
    fn keys(&self) -> SyncResult<Vec<String>> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SyncResult<()> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

/// A single JSON object on disk, rewritten through a temp file on every
/// mutation so a crash never leaves a half-written store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                SyncError::Storage(format!("{} is not a JSON object of strings: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(SyncError::Storage(format!("reading {}: {}", path.display(), e)));
            }
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "Legacy store opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> SyncResult<()> {
        let encoded = serde_json::to_string_pretty(entries)
            .map_err(|e| SyncError::Storage(format!("encoding legacy store: {}", e)))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| SyncError::Storage(format!("writing {}: {}", self.path.display(), e)))
    }
}

impl LegacyStore for FileStore {
    fn keys(&self) -> SyncResult<Vec<String>> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> SyncResult<()> {
        let mut entries = lock(&self.entries)?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
