// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Version identifier of a remote dictionary release.
pub type DictionaryId = u64;

/// A word the user proposed for the shared dictionary.
/// `synced` flips to true once the server confirms ingestion and never back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSuggestion {
    pub word: String,
    pub synced: bool,
}

impl GlobalSuggestion {
    pub fn pending(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            synced: false,
        }
    }
}

/// The persisted dictionary record.
///
/// `words` mirrors the remote release identified by `id`. `local_words`
/// and `global_suggestions` belong to this device and survive every sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSet {
    pub id: DictionaryId,
    pub language: String,
    pub words: Vec<String>,
    #[serde(default)]
    pub local_words: BTreeSet<String>,
    #[serde(default)]
    pub global_suggestions: Vec<GlobalSuggestion>,
}

impl WordSet {
    /// A fresh record built from a fetched release, with no device-local words.
    pub fn from_remote(remote: RemoteDictionary) -> Self {
        Self {
            id: remote.id,
            language: remote.language,
            words: remote.words,
            local_words: BTreeSet::new(),
            global_suggestions: Vec::new(),
        }
    }

    /// Every word the runtime view should know, in first-seen order:
    /// remote words, then local words, then suggested words.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.words
            .iter()
            .map(String::as_str)
            .chain(self.local_words.iter().map(String::as_str))
            .chain(self.global_suggestions.iter().map(|s| s.word.as_str()))
    }
}

/// A dictionary release as served by the API or the bundled fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDictionary {
    pub id: DictionaryId,
    pub words: Vec<String>,
    pub language: String,
}

/// Correction candidates for one misspelled word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub wrong: String,
    pub suggestions: Vec<String>,
}
