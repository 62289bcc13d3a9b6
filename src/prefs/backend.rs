//! Preference Backends
//!
//! Durable string-keyed storage for small JSON values. A backend stores the
//! serialized JSON text for each key; encoding and decoding happen one level
//! up in [`super::Preferences`].

use super::error::{PrefsError, PrefsResult};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Synchronous key/value storage for preference values
pub trait PreferenceBackend: Send + Sync {
    /// Read the raw JSON text stored under `key`
    fn read(&self, key: &str) -> PrefsResult<Option<String>>;

    /// Replace the raw JSON text stored under `key`
    fn write(&self, key: &str, value: &str) -> PrefsResult<()>;
}

/// Preferences kept in a single JSON document on disk
///
/// The document is a flat object keyed by preference name. Every write
/// rewrites the whole document through a temporary file and a rename, so a
/// crash mid-write leaves the previous document intact.
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Create a backend for the given document path
    ///
    /// The file and its parent directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> PrefsResult<BTreeMap<String, Value>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, document: &BTreeMap<String, Value>) -> PrefsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl PreferenceBackend for FileBackend {
    fn read(&self, key: &str) -> PrefsResult<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| PrefsError::Lock(e.to_string()))?;

        let document = self.read_document()?;
        Ok(document.get(key).map(Value::to_string))
    }

    fn write(&self, key: &str, value: &str) -> PrefsResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| PrefsError::Lock(e.to_string()))?;

        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Preferences document unreadable, starting a fresh one"
                );
                BTreeMap::new()
            }
        };

        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        document.insert(key.to_string(), value);
        self.write_document(&document)
    }
}

/// In-process preference storage
///
/// Keeps values for the lifetime of the process and records every write in
/// order, which makes it the backend of choice for tests and throwaway
/// sessions.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    reject_writes: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording it as a write
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Every write performed so far, oldest first
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    /// Values written for a single key, oldest first
    pub fn writes_for(&self, key: &str) -> Vec<String> {
        self.writes()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    /// Current raw value for a key
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Make subsequent writes fail, simulating an exhausted quota
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }
}

impl PreferenceBackend for MemoryBackend {
    fn read(&self, key: &str) -> PrefsResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PrefsError::Lock(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> PrefsResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(PrefsError::Rejected("storage quota exceeded".to_string()));
        }

        self.entries
            .lock()
            .map_err(|e| PrefsError::Lock(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        self.writes
            .lock()
            .map_err(|e| PrefsError::Lock(e.to_string()))?
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}
