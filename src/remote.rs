// File: src/remote.rs
//! Where dictionary releases come from: the HTTP API, or dictionaries
//! compiled into the binary when remote access is off.

use crate::config::DictionaryConfig;
use crate::core::types::{DictionaryId, RemoteDictionary};
use crate::error::{DictionaryError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

const BUNDLED_LUGANDA: &str = include_str!("../data/bundled/luganda.json");

#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// The newest release for `language`.
    async fn fetch_latest(&self, language: &str) -> Result<RemoteDictionary>;

    /// Whether release `id` is still the newest for `language`.
    async fn is_latest(&self, language: &str, id: DictionaryId) -> Result<bool>;

    /// Proposes words for the shared dictionary. Returns the words the
    /// server accepted for ingestion.
    async fn submit_suggestions(&self, language: &str, words: &[String]) -> Result<Vec<String>>;
}

/// Builds the source the configuration asks for.
pub fn source_for(config: &DictionaryConfig) -> Result<Arc<dyn DictionarySource>> {
    if config.use_remote_dictionary {
        Ok(Arc::new(HttpDictionarySource::new(&config.api_url, config)?))
    } else {
        Ok(Arc::new(BundledDictionaries::builtin()?))
    }
}

#[derive(Debug, Deserialize)]
struct IsLatestResponse {
    is_latest: bool,
}

#[derive(Debug, Serialize)]
struct SuggestionRequest<'a> {
    words: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AcceptedSuggestion {
    word: String,
}

/// Client for the dictionary API.
pub struct HttpDictionarySource {
    client: Client,
    base_url: Url,
}

impl HttpDictionarySource {
    pub fn new(api_url: &str, config: &DictionaryConfig) -> Result<Self> {
        let base_url = Url::parse(api_url)
            .map_err(|e| DictionaryError::Config(format!("invalid api_url {api_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DictionaryError::Config(format!(
                "api_url {api_url:?} cannot be a base URL"
            )));
        }
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(DictionaryError::Http {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait]
impl DictionarySource for HttpDictionarySource {
    #[instrument(skip(self))]
    async fn fetch_latest(&self, language: &str) -> Result<RemoteDictionary> {
        let url = self.endpoint(&["languages", language, "dictionaries", "versions", "latest"]);
        let response = Self::check_status(self.client.get(url).send().await?)?;
        let dictionary: RemoteDictionary = response.json().await?;
        debug!(id = dictionary.id, words = dictionary.words.len(), "fetched dictionary");
        Ok(dictionary)
    }

    #[instrument(skip(self))]
    async fn is_latest(&self, _language: &str, id: DictionaryId) -> Result<bool> {
        let id = id.to_string();
        let url = self.endpoint(&["dictionaries", "versions", &id, "is_latest"]);
        let response = Self::check_status(self.client.get(url).send().await?)?;
        let body: IsLatestResponse = response.json().await?;
        Ok(body.is_latest)
    }

    #[instrument(skip(self, words), fields(count = words.len()))]
    async fn submit_suggestions(&self, language: &str, words: &[String]) -> Result<Vec<String>> {
        let url = self.endpoint(&["languages", language, "suggestions"]);
        let response = self
            .client
            .post(url)
            .json(&SuggestionRequest { words })
            .send()
            .await?;
        let accepted: Vec<AcceptedSuggestion> = Self::check_status(response)?.json().await?;
        Ok(accepted.into_iter().map(|s| s.word).collect())
    }
}

/// Offline dictionaries shipped with the binary, keyed by language.
#[derive(Debug, Clone, Default)]
pub struct BundledDictionaries {
    dictionaries: HashMap<String, RemoteDictionary>,
}

impl BundledDictionaries {
    pub fn builtin() -> Result<Self> {
        let luganda: RemoteDictionary = serde_json::from_str(BUNDLED_LUGANDA)?;
        Ok(Self::default().with_dictionary(luganda))
    }

    pub fn with_dictionary(mut self, dictionary: RemoteDictionary) -> Self {
        self.dictionaries
            .insert(dictionary.language.clone(), dictionary);
        self
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }

    fn get(&self, language: &str) -> Result<&RemoteDictionary> {
        self.dictionaries
            .get(language)
            .ok_or_else(|| DictionaryError::UnsupportedLanguage(language.to_string()))
    }
}

#[async_trait]
impl DictionarySource for BundledDictionaries {
    async fn fetch_latest(&self, language: &str) -> Result<RemoteDictionary> {
        self.get(language).cloned()
    }

    async fn is_latest(&self, language: &str, id: DictionaryId) -> Result<bool> {
        Ok(self.get(language)?.id == id)
    }

    async fn submit_suggestions(&self, _language: &str, _words: &[String]) -> Result<Vec<String>> {
        Err(DictionaryError::RemoteDisabled)
    }
}
