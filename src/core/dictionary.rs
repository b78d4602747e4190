// File: src/core/dictionary.rs
use crate::core::types::{Correction, DictionaryId, WordSet};
use crate::fuzzy::FuzzyIndex;
use std::collections::HashSet;

/// Minimum similarity for a word to be offered as a correction.
pub const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Runtime view of a persisted [`WordSet`].
///
/// The lookup set and the correction index are derived together from the
/// record in [`Dictionary::build`] and never updated in place. Changing the
/// vocabulary means building a new record and a new view from it.
#[derive(Debug, Clone)]
pub struct Dictionary {
    record: WordSet,
    indexed_words: HashSet<String>,
    spell_checker: FuzzyIndex,
}

impl Dictionary {
    pub fn build(record: WordSet) -> Self {
        let indexed_words: HashSet<String> = record.vocabulary().map(str::to_string).collect();
        let spell_checker = FuzzyIndex::from_words(record.vocabulary());
        Self {
            record,
            indexed_words,
            spell_checker,
        }
    }

    pub fn record(&self) -> &WordSet {
        &self.record
    }

    pub fn into_record(self) -> WordSet {
        self.record
    }

    pub fn id(&self) -> DictionaryId {
        self.record.id
    }

    pub fn language(&self) -> &str {
        &self.record.language
    }

    pub fn indexed_words(&self) -> &HashSet<String> {
        &self.indexed_words
    }

    pub fn spell_checker(&self) -> &FuzzyIndex {
        &self.spell_checker
    }

    pub fn is_known(&self, word: &str) -> bool {
        self.indexed_words.contains(word)
    }

    /// The words not in the vocabulary, in input order.
    pub fn unknown_words<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        words
            .iter()
            .map(|word| word.as_ref())
            .filter(|word| !self.is_known(word))
            .map(str::to_string)
            .collect()
    }

    pub fn suggest_corrections(&self, word: &str) -> Correction {
        Correction {
            wrong: word.to_string(),
            suggestions: self.spell_checker.suggest(word, SUGGESTION_THRESHOLD),
        }
    }

    /// Number of suggestion entries still waiting for server confirmation.
    pub fn pending_suggestions(&self) -> usize {
        self.record
            .global_suggestions
            .iter()
            .filter(|s| !s.synced)
            .count()
    }
}
