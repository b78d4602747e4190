// File: src/state.rs
use crate::core::dictionary::Dictionary;
use crate::core::types::WordSet;
use crate::error::{DictionaryError, Result};
use crate::persistence::DictionaryRepository;
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;

/// The one in-memory dictionary of a session and its backing record.
///
/// Reads go through a lock that is never held across an await. Every
/// read-modify-write of the record is serialized by `writes`, and the
/// change is computed from the record current at that moment, so a sync
/// merge and a local edit cannot overwrite each other's fields.
pub struct DictionaryState {
    repository: DictionaryRepository,
    current: RwLock<Option<Dictionary>>,
    writes: Mutex<()>,
}

impl DictionaryState {
    /// Hydrates from the repository. An absent record is a valid start.
    pub fn hydrate(repository: DictionaryRepository) -> Result<Self> {
        let current = repository.load()?;
        Ok(Self {
            repository,
            current: RwLock::new(current),
            writes: Mutex::new(()),
        })
    }

    pub fn repository(&self) -> &DictionaryRepository {
        &self.repository
    }

    pub fn read<R>(&self, f: impl FnOnce(Option<&Dictionary>) -> R) -> R {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }

    pub fn snapshot(&self) -> Option<WordSet> {
        self.read(|dictionary| dictionary.map(|d| d.record().clone()))
    }

    /// Applies one record transition. `change` sees the current record and
    /// returns the replacement, or `None` to leave storage untouched, plus a
    /// value handed back to the caller. A replacement is saved on the blocking
    /// pool and the view is rebuilt from what was stored.
    pub async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(Option<&WordSet>) -> Result<(Option<WordSet>, T)>,
    {
        let _write = self.writes.lock().await;
        let current = self.snapshot();
        let (next, value) = change(current.as_ref())?;
        if let Some(record) = next {
            let repository = self.repository.clone();
            let dictionary = blocking(move || repository.save(&record)).await?;
            *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(dictionary);
        }
        Ok(value)
    }

    /// Drops the stored record and the in-memory view.
    pub async fn reset(&self) -> Result<()> {
        let _write = self.writes.lock().await;
        let repository = self.repository.clone();
        blocking(move || repository.clear()).await?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Runs store I/O off the async workers.
async fn blocking<T, F>(io: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(io)
        .await
        .map_err(|e| DictionaryError::Storage(format!("store task failed: {e}")))?
}
