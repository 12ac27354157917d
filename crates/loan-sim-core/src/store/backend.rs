use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoanSimError;
use crate::LoanSimResult;

/// A process-wide keyed string store (local-storage semantics).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> LoanSimResult<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> LoanSimResult<()>;
    fn remove(&mut self, key: &str) -> LoanSimResult<()>;
}

/// In-memory store, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> LoanSimResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> LoanSimResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> LoanSimResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Single JSON file holding an object of key -> string value.
///
/// A missing file reads as an empty store; every write rewrites the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self, key: &str) -> LoanSimResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.storage_error(key, e))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| self.storage_error(key, e))
    }

    fn write_all(&self, key: &str, entries: &BTreeMap<String, String>) -> LoanSimResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.storage_error(key, e))?;
        }
        let body = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, body).map_err(|e| self.storage_error(key, e))
    }

    fn storage_error(&self, key: &str, e: impl std::fmt::Display) -> LoanSimError {
        LoanSimError::StorageError {
            key: key.to_string(),
            reason: format!("{}: {}", self.path.display(), e),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> LoanSimResult<Option<String>> {
        Ok(self.read_all(key)?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> LoanSimResult<()> {
        let mut entries = self.read_all(key)?;
        entries.insert(key.to_string(), value);
        self.write_all(key, &entries)
    }

    fn remove(&mut self, key: &str) -> LoanSimResult<()> {
        let mut entries = self.read_all(key)?;
        if entries.remove(key).is_some() {
            self.write_all(key, &entries)?;
        }
        Ok(())
    }
}
