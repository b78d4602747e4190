// File: src/fuzzy/symspell.rs
use std::collections::{HashMap, HashSet};

/// Position of a word in the index vocabulary.
pub type WordId = usize;

pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 2;
pub const DEFAULT_PREFIX_LENGTH: usize = 7;
/// Below this many delete-index hits the whole vocabulary is scored.
pub const MIN_DELETE_CANDIDATES: usize = 8;

/// Correction index over a vocabulary.
///
/// Candidates are found with the Symmetric Delete (SymSpell) trick: every
/// word's delete variants are precomputed, so a lookup only has to generate
/// the deletes of the input, independent of dictionary size. Candidates are
/// then scored with Jaro-Winkler similarity in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
    /// Vocabulary in first-seen order; a word's position is its `WordId`.
    words: Vec<String>,
    ids: HashMap<String, WordId>,
    /// Maps a delete variant (e.g., "bna") to the words it came from.
    deletes: HashMap<String, HashSet<WordId>>,
    max_edit_distance: usize,
    prefix_length: usize,
}

impl Default for FuzzyIndex {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EDIT_DISTANCE, DEFAULT_PREFIX_LENGTH)
    }
}

impl FuzzyIndex {
    pub fn new(max_edit_distance: usize, prefix_length: usize) -> Self {
        Self {
            words: Vec::new(),
            ids: HashMap::new(),
            deletes: HashMap::new(),
            max_edit_distance,
            // Deletes of a prefix shorter than the edit distance would be empty.
            prefix_length: prefix_length.max(max_edit_distance + 1),
        }
    }

    /// Builds an index with default parameters over `words`, skipping duplicates.
    pub fn from_words<'a, I>(words: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self::default();
        for word in words {
            index.add_word(word);
        }
        index
    }

    /// Adds a word by generating its delete variants and mapping them back
    /// to the word's id. Re-adding a known word returns the existing id.
    /// Complexity: O(p^d) in the prefix length p and edit distance d.
    pub fn add_word(&mut self, word: &str) -> WordId {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.words.len();
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);

        for edit in self.generate_edits(word) {
            self.deletes.entry(edit).or_default().insert(id);
        }
        id
    }

    pub fn contains(&self, word: &str) -> bool {
        self.ids.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Similarity used for ranking; 1.0 means identical.
    pub fn score(a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }

    /// Words scoring at least `min_score` against `input`, best first.
    /// Equal scores keep vocabulary order.
    ///
    /// Candidates come from the delete index. When it yields fewer than
    /// [`MIN_DELETE_CANDIDATES`] words (short inputs against longer words,
    /// small vocabularies) every word is scored instead. Otherwise a word
    /// sharing no delete variant with the input prefix is not considered,
    /// even if it would pass `min_score`.
    pub fn suggest(&self, input: &str, min_score: f64) -> Vec<String> {
        let hits = self.candidates(input);
        let mut candidates: Vec<WordId> = if hits.len() < MIN_DELETE_CANDIDATES {
            (0..self.words.len()).collect()
        } else {
            hits.into_iter().collect()
        };
        candidates.sort_unstable();

        let mut scored: Vec<(WordId, f64)> = candidates
            .into_iter()
            .map(|id| (id, Self::score(input, &self.words[id])))
            .filter(|&(_, score)| score >= min_score)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .map(|(id, _)| self.words[id].clone())
            .collect()
    }

    /// Ids of every word sharing a delete variant with `input`.
    fn candidates(&self, input: &str) -> HashSet<WordId> {
        let mut candidates = HashSet::new();
        for edit in self.generate_edits(input) {
            if let Some(word_ids) = self.deletes.get(&edit) {
                candidates.extend(word_ids.iter().copied());
            }
        }
        candidates
    }

    /// All unique variants of the word's prefix within `max_edit_distance`
    /// deletions, including the prefix itself. Works on chars, not bytes.
    fn generate_edits(&self, word: &str) -> HashSet<String> {
        let prefix: String = word.chars().take(self.prefix_length).collect();
        let mut edits = HashSet::new();
        edits.insert(prefix.clone());

        let mut current_edits = vec![prefix];
        for _ in 0..self.max_edit_distance {
            let mut next_edits = Vec::new();
            for edit in &current_edits {
                let chars: Vec<char> = edit.chars().collect();
                for skip in 0..chars.len() {
                    let variant: String = chars
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != skip)
                        .map(|(_, c)| *c)
                        .collect();
                    if edits.insert(variant.clone()) {
                        next_edits.push(variant);
                    }
                }
            }
            current_edits = next_edits;
        }

        edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.7;

    #[test]
    fn suggests_close_words_above_threshold() {
        let vocab = ["the", "ten", "tea"];
        let index = FuzzyIndex::from_words(vocab);
        let suggestions = index.suggest("teh", THRESHOLD);

        assert!(!suggestions.is_empty());
        for word in &suggestions {
            assert!(vocab.contains(&word.as_str()));
            assert!(FuzzyIndex::score("teh", word) >= THRESHOLD);
        }
        let scores: Vec<f64> = suggestions
            .iter()
            .map(|w| FuzzyIndex::score("teh", w))
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn exact_word_ranks_first() {
        let index = FuzzyIndex::from_words(["omusajja", "omukazi", "omusaja"]);
        let suggestions = index.suggest("omusajja", THRESHOLD);
        assert_eq!(suggestions.first().map(String::as_str), Some("omusajja"));
    }

    #[test]
    fn distant_words_are_not_suggested() {
        let index = FuzzyIndex::from_words(["kitabo", "ennyumba"]);
        assert!(index.suggest("xyz", THRESHOLD).is_empty());
    }

    #[test]
    fn empty_index_suggests_nothing() {
        let index = FuzzyIndex::default();
        assert!(index.is_empty());
        assert!(index.suggest("anything", 0.0).is_empty());
    }

    #[test]
    fn duplicates_are_indexed_once() {
        let mut index = FuzzyIndex::default();
        let first = index.add_word("mu");
        let second = index.add_word("mu");
        assert_eq!(first, second);
        assert_eq!(index.len(), 1);
        assert_eq!(index.suggest("mu", THRESHOLD), vec!["mu".to_string()]);
    }

    #[test]
    fn short_inputs_still_reach_longer_words() {
        let index = FuzzyIndex::from_words(["muntu"]);
        assert!(FuzzyIndex::score("mu", "muntu") >= THRESHOLD);
        assert_eq!(index.suggest("mu", THRESHOLD), vec!["muntu".to_string()]);

        let index = FuzzyIndex::from_words(["abcd"]);
        assert_eq!(index.suggest("a", THRESHOLD), vec!["abcd".to_string()]);
    }

    #[test]
    fn sparse_hits_fall_back_to_the_whole_vocabulary() {
        let index = FuzzyIndex::from_words(["okusoma", "okusomesa", "kitabo", "muntu"]);
        let suggestions = index.suggest("mu", THRESHOLD);
        assert!(suggestions.contains(&"muntu".to_string()));
        for word in &suggestions {
            assert!(FuzzyIndex::score("mu", word) >= THRESHOLD);
        }
    }

    #[test]
    fn handles_multibyte_characters() {
        let index = FuzzyIndex::from_words(["ŋŋaali", "ŋŋoma"]);
        assert!(index.contains("ŋŋoma"));
        let suggestions = index.suggest("ŋŋomma", THRESHOLD);
        assert_eq!(suggestions.first().map(String::as_str), Some("ŋŋoma"));
    }

    #[test]
    fn long_words_match_on_prefix() {
        let index = FuzzyIndex::from_words(["okusoma", "okusomesa", "okuwandiika"]);
        let suggestions = index.suggest("okusomes", THRESHOLD);
        assert!(suggestions.contains(&"okusomesa".to_string()));
    }
}
