// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod fuzzy;
pub mod manager;
pub mod persistence;
pub mod reconcile;
pub mod remote;
pub mod state;
pub mod sync;

pub use crate::config::DictionaryConfig;
pub use crate::core::dictionary::{Dictionary, SUGGESTION_THRESHOLD};
pub use crate::core::types::{Correction, GlobalSuggestion, RemoteDictionary, WordSet};
pub use crate::error::{DictionaryError, Result};
pub use crate::manager::{DictionaryManager, SessionTasks};
pub use crate::sync::SyncOutcome;
