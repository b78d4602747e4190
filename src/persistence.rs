// File: src/persistence.rs
use crate::core::dictionary::Dictionary;
use crate::core::types::WordSet;
use crate::error::{DictionaryError, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Keys become file names: ASCII letters, digits, `-`, `_` and `.`, not
/// starting with a dot.
pub fn is_valid_storage_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Durable key-value byte store.
pub trait PersistenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One file per key inside a directory. Writes go to a temp file in the
/// same directory and are renamed into place, so a crash never leaves a
/// half-written record behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_storage_key(key) {
            return Err(DictionaryError::Storage(format!("invalid storage key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.bin")))
    }
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        BufReader::new(file).read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let temp_file = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(&temp_file);
            writer.write_all(bytes)?;
            writer.flush()?;
        }
        temp_file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Loads and saves the dictionary record under one storage key.
#[derive(Clone)]
pub struct DictionaryRepository {
    store: Arc<dyn PersistenceStore>,
    key: String,
}

impl DictionaryRepository {
    pub fn new(store: Arc<dyn PersistenceStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the stored record and derives its runtime view.
    /// A missing record is `Ok(None)`. So is a record that no longer decodes;
    /// there is no schema migration, the next fetch replaces it.
    pub fn load(&self) -> Result<Option<Dictionary>> {
        let Some(bytes) = self.store.get(&self.key)? else {
            debug!(key = %self.key, "no stored dictionary");
            return Ok(None);
        };
        match bincode::deserialize::<WordSet>(&bytes) {
            Ok(record) => Ok(Some(Dictionary::build(record))),
            Err(e) => {
                warn!(key = %self.key, error = %e, "stored dictionary is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    /// Writes the record, then reads it back so the returned view is always
    /// derived from what is durably stored.
    pub fn save(&self, record: &WordSet) -> Result<Dictionary> {
        let bytes = bincode::serialize(record)?;
        self.store.put(&self.key, &bytes)?;
        debug!(key = %self.key, id = record.id, "dictionary saved");
        self.load()?.ok_or_else(|| {
            DictionaryError::Storage(format!("record under {:?} vanished after write", self.key))
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}
