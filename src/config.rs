// File: src/config.rs
use crate::error::{DictionaryError, Result};
use crate::persistence;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "SPELLSYNC_";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_LANGUAGE: &str = "Luganda";
pub const DEFAULT_STORAGE_KEY: &str = "dictionary";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Fetch from the API; when false the bundled dictionaries are used.
    pub use_remote_dictionary: bool,
    pub api_url: String,
    pub language: String,
    pub dictionary_storage_key: String,
    pub storage_dir: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            use_remote_dictionary: true,
            api_url: DEFAULT_API_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            dictionary_storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: default_storage_dir(),
            request_timeout_secs: 30,
        }
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("spellsync"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl DictionaryConfig {
    /// Defaults, then the TOML file if given and present, then
    /// `SPELLSYNC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| DictionaryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// A config for tests and embedded use: bundled source, default key.
    pub fn offline(language: impl Into<String>) -> Self {
        Self {
            use_remote_dictionary: false,
            language: language.into(),
            ..Self::default()
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.use_remote_dictionary = true;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(DictionaryError::Config("language must not be empty".into()));
        }
        if self.dictionary_storage_key.trim().is_empty() {
            return Err(DictionaryError::Config(
                "dictionary_storage_key must not be empty".into(),
            ));
        }
        if !persistence::is_valid_storage_key(&self.dictionary_storage_key) {
            return Err(DictionaryError::Config(format!(
                "dictionary_storage_key may only hold ASCII letters, digits, '-', '_' and '.', got {:?}",
                self.dictionary_storage_key
            )));
        }
        if self.use_remote_dictionary
            && !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://"))
        {
            return Err(DictionaryError::Config(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        Ok(())
    }
}
