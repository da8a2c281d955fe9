//! Key/value persistence backends
//!
//! The store keeps each collection as one JSON document under a fixed key,
//! the same way a browser's local storage would.

use crate::error::BackendError;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Durable key/value document storage.
pub trait StateBackend: Send {
    /// Read the document stored under `key`, `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Replace the document stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError>;
}

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a sibling temporary file that is renamed into place, so a
/// reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a backend rooted at `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, BackendError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        debug!(key, bytes = value.len(), path = %path.display(), "Persisted document");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    docs: HashMap<String, String>,
    capacity: Option<usize>,
    writes: usize,
}

/// In-memory backend. Clones share the same documents, so dropping a store
/// and reopening it over a clone behaves like a process restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses writes once the total stored size would exceed
    /// `bytes`.
    pub fn with_capacity(bytes: usize) -> Self {
        let backend = Self::new();
        backend.set_capacity(Some(bytes));
        backend
    }

    pub fn set_capacity(&self, bytes: Option<usize>) {
        self.lock().capacity = bytes;
    }

    /// Raw stored document, for byte-level comparisons.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().docs.get(key).cloned()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.lock().docs.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut state = self.lock();

        if let Some(capacity) = state.capacity {
            let others: usize = state
                .docs
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = capacity.saturating_sub(others);
            if value.len() > available {
                return Err(BackendError::CapacityExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    available,
                });
            }
        }

        state.docs.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }
}
