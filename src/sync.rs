// File: src/sync.rs
use crate::core::dictionary::Dictionary;
use crate::core::types::DictionaryId;
use crate::error::Result;
use crate::reconcile;
use crate::remote::DictionarySource;
use crate::state::DictionaryState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// How a refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another refresh was in flight; nothing was done.
    AlreadyRunning,
    UpToDate,
    Updated { id: DictionaryId },
    /// A remote call failed. The dictionary is unchanged.
    Failed,
}

/// Keeps the local dictionary in step with its source.
///
/// At most one refresh runs at a time; the guard is the `busy` flag, not
/// the transport. The suggestion push is independent of it and may overlap
/// a refresh, since the two touch disjoint fields of the record.
pub struct SyncCoordinator {
    state: Arc<DictionaryState>,
    source: Arc<dyn DictionarySource>,
    language: String,
    busy: AtomicBool,
    updating: watch::Sender<bool>,
}

/// Clears the busy flag however the refresh ends.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    updating: &'a watch::Sender<bool>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.updating.send_replace(false);
    }
}

impl SyncCoordinator {
    pub fn new(
        state: Arc<DictionaryState>,
        source: Arc<dyn DictionarySource>,
        language: impl Into<String>,
    ) -> Self {
        let (updating, _) = watch::channel(false);
        Self {
            state,
            source,
            language: language.into(),
            busy: AtomicBool::new(false),
            updating,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_updating(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.updating.subscribe()
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.updating.send_replace(true);
        Some(BusyGuard {
            busy: &self.busy,
            updating: &self.updating,
        })
    }

    /// Checks freshness and, when stale, fetches and merges the latest
    /// release. Remote failures are logged and reported as
    /// [`SyncOutcome::Failed`]; configuration and storage errors are returned.
    #[instrument(skip(self), fields(language = %self.language))]
    pub async fn refresh(&self) -> Result<SyncOutcome> {
        let Some(_guard) = self.try_begin() else {
            debug!("refresh already in flight");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let local_id = self.state.read(|dictionary| dictionary.map(Dictionary::id));
        let fresh = match local_id {
            None => false,
            Some(id) => match swallow_transport(self.source.is_latest(&self.language, id).await)? {
                Some(fresh) => fresh,
                None => return Ok(SyncOutcome::Failed),
            },
        };
        if fresh {
            debug!(id = ?local_id, "dictionary is current");
            return Ok(SyncOutcome::UpToDate);
        }

        let Some(remote) = swallow_transport(self.source.fetch_latest(&self.language).await)?
        else {
            return Ok(SyncOutcome::Failed);
        };
        let id = remote.id;
        self.state
            .mutate(|current| Ok((Some(reconcile::merged_with_remote(current, remote)), ())))
            .await?;
        info!(from = ?local_id, to = id, "dictionary updated");
        Ok(SyncOutcome::Updated { id })
    }

    /// Submits pending global suggestions and marks the confirmed ones.
    /// Returns how many entries were marked synced.
    #[instrument(skip(self), fields(language = %self.language))]
    pub async fn push_suggestions(&self) -> Result<usize> {
        let words = self.state.read(|dictionary| {
            dictionary
                .map(|d| reconcile::unsynced_words(d.record()))
                .unwrap_or_default()
        });
        if words.is_empty() {
            debug!("no pending suggestions");
            return Ok(0);
        }

        let Some(accepted) =
            swallow_transport(self.source.submit_suggestions(&self.language, &words).await)?
        else {
            return Ok(0);
        };

        let marked = self
            .state
            .mutate(|current| {
                let Some(record) = current else {
                    return Ok((None, 0));
                };
                let (next, marked) = reconcile::with_synced(record, &accepted);
                Ok(if marked > 0 { (Some(next), marked) } else { (None, 0) })
            })
            .await?;
        info!(submitted = words.len(), accepted = accepted.len(), marked, "suggestions pushed");
        Ok(marked)
    }
}

/// Turns a remote failure into `None` after logging it.
fn swallow_transport<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_transport() => {
            warn!(error = %e, "remote dictionary call failed");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RemoteDictionary, WordSet};
    use crate::error::DictionaryError;
    use crate::persistence::{DictionaryRepository, MemoryStore};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        latest_id: DictionaryId,
        offline: bool,
        fetches: AtomicUsize,
        submitted: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl DictionarySource for FakeSource {
        async fn fetch_latest(&self, language: &str) -> Result<RemoteDictionary> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return Err(DictionaryError::Http {
                    status: 503,
                    url: "fake".into(),
                });
            }
            Ok(RemoteDictionary {
                id: self.latest_id,
                words: vec!["mu".into(), "ne".into()],
                language: language.to_string(),
            })
        }

        async fn is_latest(&self, _language: &str, id: DictionaryId) -> Result<bool> {
            if self.offline {
                return Err(DictionaryError::RemoteDisabled);
            }
            Ok(id == self.latest_id)
        }

        async fn submit_suggestions(&self, _language: &str, words: &[String]) -> Result<Vec<String>> {
            self.submitted.lock().unwrap().push(words.to_vec());
            Ok(words.to_vec())
        }
    }

    fn coordinator(source: FakeSource) -> (Arc<DictionaryState>, Arc<FakeSource>, SyncCoordinator) {
        let repo = DictionaryRepository::new(Arc::new(MemoryStore::new()), "dictionary");
        let state = Arc::new(DictionaryState::hydrate(repo).unwrap());
        let source = Arc::new(source);
        let sync = SyncCoordinator::new(state.clone(), source.clone(), "Luganda");
        (state, source, sync)
    }

    #[tokio::test]
    async fn missing_dictionary_is_fetched() {
        let (state, source, sync) = coordinator(FakeSource {
            latest_id: 3,
            ..Default::default()
        });
        assert_eq!(sync.refresh().await.unwrap(), SyncOutcome::Updated { id: 3 });
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(state.snapshot().unwrap().id, 3);
        assert!(!sync.is_updating());
    }

    #[tokio::test]
    async fn current_dictionary_is_not_refetched() {
        let (_, source, sync) = coordinator(FakeSource {
            latest_id: 3,
            ..Default::default()
        });
        sync.refresh().await.unwrap();
        assert_eq!(sync.refresh().await.unwrap(), SyncOutcome::UpToDate);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_dictionary_keeps_device_fields() {
        let (state, _, sync) = coordinator(FakeSource {
            latest_id: 9,
            ..Default::default()
        });
        state
            .mutate(|_| {
                let mut record = WordSet::from_remote(RemoteDictionary {
                    id: 2,
                    words: vec!["old".into()],
                    language: "Luganda".into(),
                });
                record.local_words.insert("kale".into());
                Ok((Some(reconcile::with_global_suggestion(&record, "kati")), ()))
            })
            .await
            .unwrap();

        assert_eq!(sync.refresh().await.unwrap(), SyncOutcome::Updated { id: 9 });
        let record = state.snapshot().unwrap();
        assert_eq!(record.words, vec!["mu".to_string(), "ne".to_string()]);
        assert!(record.local_words.contains("kale"));
        assert_eq!(record.global_suggestions.len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let (state, _, sync) = coordinator(FakeSource {
            offline: true,
            ..Default::default()
        });
        assert_eq!(sync.refresh().await.unwrap(), SyncOutcome::Failed);
        assert!(state.snapshot().is_none());
        assert!(!sync.is_updating());
        assert!(!*sync.subscribe().borrow());
    }

    #[tokio::test]
    async fn second_refresh_while_busy_is_a_no_op() {
        let (_, source, sync) = coordinator(FakeSource::default());
        let guard = sync.try_begin().unwrap();
        assert!(sync.is_updating());
        assert_eq!(sync.refresh().await.unwrap(), SyncOutcome::AlreadyRunning);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        drop(guard);
        assert!(!sync.is_updating());
    }

    #[tokio::test]
    async fn push_marks_confirmed_words_once() {
        let (state, source, sync) = coordinator(FakeSource::default());
        sync.refresh().await.unwrap();
        state
            .mutate(|current| {
                let record = reconcile::with_global_suggestion(current.unwrap(), "kati");
                Ok((Some(reconcile::with_global_suggestion(&record, "kati")), ()))
            })
            .await
            .unwrap();

        assert_eq!(sync.push_suggestions().await.unwrap(), 2);
        assert_eq!(*source.submitted.lock().unwrap(), vec![vec!["kati".to_string()]]);
        assert!(state.snapshot().unwrap().global_suggestions.iter().all(|s| s.synced));

        assert_eq!(sync.push_suggestions().await.unwrap(), 0);
        assert_eq!(source.submitted.lock().unwrap().len(), 1);
    }
}
