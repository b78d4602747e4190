// File: src/manager.rs
use crate::config::DictionaryConfig;
use crate::core::types::{Correction, WordSet};
use crate::error::{DictionaryError, Result};
use crate::persistence::{DictionaryRepository, FileStore, PersistenceStore};
use crate::reconcile;
use crate::remote::{self, DictionarySource};
use crate::state::DictionaryState;
use crate::sync::{SyncCoordinator, SyncOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Entry point for consumers of the dictionary: spelling queries,
/// corrections, word edits and the refresh trigger.
#[derive(Clone)]
pub struct DictionaryManager {
    state: Arc<DictionaryState>,
    sync: Arc<SyncCoordinator>,
}

/// The two background jobs a session starts with.
pub struct SessionTasks {
    pub refresh: JoinHandle<()>,
    pub push: JoinHandle<()>,
}

impl SessionTasks {
    /// Waits for both jobs. Each one logs its own failures.
    pub async fn join(self) {
        for (name, handle) in [("refresh", self.refresh), ("push", self.push)] {
            if let Err(e) = handle.await {
                error!(task = name, error = %e, "dictionary task aborted");
            }
        }
    }
}

impl DictionaryManager {
    /// Opens the file-backed dictionary and the source the config selects.
    pub fn new(config: &DictionaryConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(FileStore::new(&config.storage_dir));
        let source = remote::source_for(config)?;
        Self::with_parts(store, source, config)
    }

    pub fn with_parts(
        store: Arc<dyn PersistenceStore>,
        source: Arc<dyn DictionarySource>,
        config: &DictionaryConfig,
    ) -> Result<Self> {
        let repository = DictionaryRepository::new(store, config.dictionary_storage_key.clone());
        let state = Arc::new(DictionaryState::hydrate(repository)?);
        let sync = Arc::new(SyncCoordinator::new(state.clone(), source, config.language.clone()));
        Ok(Self { state, sync })
    }

    /// Kicks off the freshness check and the suggestion push as two
    /// independent tasks. Must be called inside a tokio runtime.
    pub fn start(&self) -> SessionTasks {
        let sync = self.sync.clone();
        let refresh = tokio::spawn(async move {
            match sync.refresh().await {
                Ok(outcome) => debug!(?outcome, "startup refresh finished"),
                Err(e) => error!(error = %e, "startup refresh failed"),
            }
        });

        let sync = self.sync.clone();
        let push = tokio::spawn(async move {
            if let Err(e) = sync.push_suggestions().await {
                error!(error = %e, "suggestion push failed");
            }
        });

        SessionTasks { refresh, push }
    }

    pub fn language(&self) -> &str {
        self.sync.language()
    }

    pub fn has_dictionary(&self) -> bool {
        self.state.read(|dictionary| dictionary.is_some())
    }

    /// The stored record, if any.
    pub fn snapshot(&self) -> Option<WordSet> {
        self.state.snapshot()
    }

    /// Filters `words` down to the ones the dictionary does not know.
    pub async fn check_spellings<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<String>> {
        self.state.read(|dictionary| {
            dictionary
                .map(|d| d.unknown_words(words))
                .ok_or(DictionaryError::NotLoaded)
        })
    }

    pub fn suggest_corrections(&self, word: &str) -> Result<Correction> {
        self.state.read(|dictionary| {
            dictionary
                .map(|d| d.suggest_corrections(word))
                .ok_or(DictionaryError::NotLoaded)
        })
    }

    pub fn pending_suggestions(&self) -> usize {
        self.state
            .read(|dictionary| dictionary.map_or(0, |d| d.pending_suggestions()))
    }

    /// Adds a word known only on this device. Adding it again changes nothing.
    pub async fn add_word_local(&self, word: &str) -> Result<()> {
        let word = normalize(word)?;
        let added = self
            .state
            .mutate(|current| {
                let record = current.ok_or(DictionaryError::NotLoaded)?;
                let next = reconcile::with_local_word(record, word);
                let added = next.is_some();
                Ok((next, added))
            })
            .await?;
        if added {
            info!(word, "added local word");
        }
        Ok(())
    }

    /// Proposes a word for the shared dictionary. Every call appends a new
    /// pending entry; the next push submits it.
    pub async fn add_word_global(&self, word: &str) -> Result<()> {
        let word = normalize(word)?;
        self.state
            .mutate(|current| {
                let record = current.ok_or(DictionaryError::NotLoaded)?;
                Ok((Some(reconcile::with_global_suggestion(record, word)), ()))
            })
            .await?;
        info!(word, "queued global suggestion");
        Ok(())
    }

    /// Forgets device-only words. Remote words and suggestions stay.
    pub async fn clear_local_dictionary(&self) -> Result<()> {
        self.state
            .mutate(|current| {
                let record = current.ok_or(DictionaryError::NotLoaded)?;
                Ok((Some(reconcile::with_local_cleared(record)), ()))
            })
            .await?;
        info!("cleared local words");
        Ok(())
    }

    /// Drops the stored record entirely; the next refresh starts over.
    pub async fn reset(&self) -> Result<()> {
        self.state.reset().await?;
        info!("dictionary reset");
        Ok(())
    }

    /// Runs the refresh cycle again. A no-op while one is in flight.
    pub async fn retry_dictionary_download(&self) -> Result<SyncOutcome> {
        self.sync.refresh().await
    }

    pub async fn push_suggestions(&self) -> Result<usize> {
        self.sync.push_suggestions().await
    }

    /// True while a refresh is in flight.
    pub fn dictionary_updating(&self) -> bool {
        self.sync.is_updating()
    }

    pub fn subscribe_updating(&self) -> watch::Receiver<bool> {
        self.sync.subscribe()
    }
}

fn normalize(word: &str) -> Result<&str> {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        return Err(DictionaryError::InvalidWord(word.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RemoteDictionary;
    use crate::persistence::MemoryStore;
    use crate::remote::BundledDictionaries;

    fn bundle() -> BundledDictionaries {
        BundledDictionaries::default().with_dictionary(RemoteDictionary {
            id: 1,
            words: vec!["mu".into(), "ne".into()],
            language: "Luganda".into(),
        })
    }

    fn manager() -> DictionaryManager {
        let config = DictionaryConfig::offline("Luganda");
        DictionaryManager::with_parts(Arc::new(MemoryStore::new()), Arc::new(bundle()), &config)
            .unwrap()
    }

    async fn loaded() -> DictionaryManager {
        let manager = manager();
        manager.retry_dictionary_download().await.unwrap();
        manager
    }

    #[tokio::test]
    async fn queries_need_a_dictionary() {
        let manager = manager();
        assert!(!manager.has_dictionary());
        assert!(matches!(
            manager.check_spellings(&["mu"]).await,
            Err(DictionaryError::NotLoaded)
        ));
        assert!(matches!(manager.suggest_corrections("mu"), Err(DictionaryError::NotLoaded)));
        assert!(matches!(
            manager.add_word_local("ne").await,
            Err(DictionaryError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn first_fetch_loads_the_dictionary() {
        let manager = loaded().await;
        assert!(manager.has_dictionary());
        assert_eq!(
            manager.check_spellings(&["mu", "xx"]).await.unwrap(),
            vec!["xx".to_string()]
        );
    }

    #[tokio::test]
    async fn local_words_are_known_and_idempotent() {
        let manager = loaded().await;
        manager.add_word_local("kale").await.unwrap();
        let once = manager.snapshot().unwrap().local_words;
        manager.add_word_local("kale").await.unwrap();
        assert_eq!(manager.snapshot().unwrap().local_words, once);
        assert!(manager.check_spellings(&["kale"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_words_are_rejected() {
        let manager = loaded().await;
        assert!(matches!(
            manager.add_word_global("   ").await,
            Err(DictionaryError::InvalidWord(_))
        ));
    }

    #[tokio::test]
    async fn words_are_trimmed() {
        let manager = loaded().await;
        manager.add_word_local("  kale ").await.unwrap();
        assert!(manager.snapshot().unwrap().local_words.contains("kale"));
    }

    #[tokio::test]
    async fn global_words_count_as_known_before_sync() {
        let manager = loaded().await;
        manager.add_word_global("kati").await.unwrap();
        manager.add_word_global("kati").await.unwrap();
        assert_eq!(manager.pending_suggestions(), 2);
        assert!(manager.check_spellings(&["kati"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bundled_push_fails_softly() {
        let manager = loaded().await;
        manager.add_word_global("kati").await.unwrap();
        assert_eq!(manager.push_suggestions().await.unwrap(), 0);
        assert_eq!(manager.pending_suggestions(), 1);
    }

    #[tokio::test]
    async fn start_runs_both_tasks() {
        let manager = manager();
        manager.start().join().await;
        assert!(manager.has_dictionary());
        assert!(!manager.dictionary_updating());
    }

    #[tokio::test]
    async fn reset_forgets_the_dictionary() {
        let manager = loaded().await;
        manager.reset().await.unwrap();
        assert!(!manager.has_dictionary());
    }
}
