// File: src/reconcile.rs
//! Record transitions. Each function builds a new [`WordSet`] from the
//! current one with a single concern changed; callers persist the result.

use crate::core::types::{GlobalSuggestion, RemoteDictionary, WordSet};
use std::collections::HashSet;

/// Adds a device-only word. Returns `None` when the word is already local.
pub fn with_local_word(record: &WordSet, word: &str) -> Option<WordSet> {
    if record.local_words.contains(word) {
        return None;
    }
    let mut next = record.clone();
    next.local_words.insert(word.to_string());
    Some(next)
}

/// Appends a pending proposal, even if the word is already known or proposed.
pub fn with_global_suggestion(record: &WordSet, word: &str) -> WordSet {
    let mut next = record.clone();
    next.global_suggestions.push(GlobalSuggestion::pending(word));
    next
}

pub fn with_local_cleared(record: &WordSet) -> WordSet {
    let mut next = record.clone();
    next.local_words.clear();
    next
}

/// Marks every unsynced entry whose word the server confirmed.
/// Returns the new record and how many entries changed.
pub fn with_synced<S: AsRef<str>>(record: &WordSet, confirmed: &[S]) -> (WordSet, usize) {
    let confirmed: HashSet<&str> = confirmed.iter().map(|w| w.as_ref()).collect();
    let mut next = record.clone();
    let mut marked = 0;
    for suggestion in next.global_suggestions.iter_mut() {
        if !suggestion.synced && confirmed.contains(suggestion.word.as_str()) {
            suggestion.synced = true;
            marked += 1;
        }
    }
    (next, marked)
}

/// Lays a fetched release over the existing record. Only `id`, `words` and
/// `language` come from the release; device-owned fields are kept.
pub fn merged_with_remote(existing: Option<&WordSet>, remote: RemoteDictionary) -> WordSet {
    match existing {
        Some(current) => WordSet {
            id: remote.id,
            language: remote.language,
            words: remote.words,
            local_words: current.local_words.clone(),
            global_suggestions: current.global_suggestions.clone(),
        },
        None => WordSet::from_remote(remote),
    }
}

/// Distinct words of pending suggestions, in first-seen order.
pub fn unsynced_words(record: &WordSet) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for suggestion in &record.global_suggestions {
        if !suggestion.synced && seen.insert(suggestion.word.as_str()) {
            words.push(suggestion.word.clone());
        }
    }
    words
}
