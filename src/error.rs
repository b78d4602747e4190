// File: src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Http { status: u16, url: String },

    #[error("No bundled dictionary for language: {0}")]
    UnsupportedLanguage(String),

    #[error("Remote dictionary access is disabled")]
    RemoteDisabled,

    #[error("No dictionary loaded")]
    NotLoaded,

    #[error("Invalid word: {0:?}")]
    InvalidWord(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DictionaryError {
    /// Failures of a remote call. The sync layer logs and swallows these;
    /// everything else reaches the caller.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DictionaryError::Transport(_)
                | DictionaryError::Http { .. }
                | DictionaryError::RemoteDisabled
                | DictionaryError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DictionaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_transport_failures() {
        let http = DictionaryError::Http {
            status: 503,
            url: "http://localhost/x".into(),
        };
        assert!(http.is_transport());
        assert!(DictionaryError::RemoteDisabled.is_transport());
        assert!(!DictionaryError::UnsupportedLanguage("Klingon".into()).is_transport());
        assert!(!DictionaryError::NotLoaded.is_transport());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = DictionaryError::UnsupportedLanguage("Klingon".into());
        assert_eq!(err.to_string(), "No bundled dictionary for language: Klingon");
    }
}
