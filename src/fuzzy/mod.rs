pub mod symspell;

pub use symspell::FuzzyIndex;
