use std::time::Duration;

use async_trait::async_trait;
use lexis_algo::{LibraryId, VocabularyEntry, WordId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{LibraryCounts, LibraryWords, WordQuery, WordSource, WordSourceError};
use crate::config::Config;

const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;

#[derive(Debug, Clone)]
pub struct WordSourceConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl WordSourceConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: normalize_base_url(&config.api_url),
            api_token: config.api_token.clone(),
            timeout: config.request_timeout,
        }
    }
}

/// Backend response envelope: `{ success, data, error }`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<Option<T>, WordSourceError> {
        if self.success {
            return Ok(self.data);
        }
        let reason = self
            .error
            .or(self.message)
            .unwrap_or_else(|| "request was not successful".to_string());
        Err(WordSourceError::Api(reason))
    }
}

#[derive(Debug, Deserialize)]
struct LibraryPayload {
    library: LibraryBody,
}

#[derive(Debug, Deserialize)]
struct LibraryBody {
    #[serde(default)]
    words: Vec<VocabularyEntry>,
    #[serde(flatten)]
    counts: LibraryCounts,
}

#[derive(Clone)]
pub struct HttpWordSource {
    config: WordSourceConfig,
    client: reqwest::Client,
}

impl HttpWordSource {
    pub fn new(config: WordSourceConfig) -> Result<Self, WordSourceError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn from_config(config: &Config) -> Result<Self, WordSourceError> {
        Self::new(WordSourceConfig::from_config(config))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<Option<T>, WordSourceError> {
        let mut last_error: Option<WordSourceError> = None;

        for retry in 0..=MAX_RETRIES {
            match self.authorize(build()).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(|e| {
                            warn!(error = %e, "failed to parse word source response");
                            WordSourceError::Json(e)
                        })?;
                        return envelope.into_result();
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = WordSourceError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, ?status, "word source request failed, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = WordSourceError::Request(e);
                    if retry < MAX_RETRIES {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, "word source request error, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| WordSourceError::Api("retries exhausted".to_string())))
    }
}

#[async_trait]
impl WordSource for HttpWordSource {
    async fn get_library_words(
        &self,
        library_id: LibraryId,
        query: WordQuery,
    ) -> Result<LibraryWords, WordSourceError> {
        let url = self.url(&format!("/libraries/{library_id}"));
        let params = query_params(&query);
        debug!(
            library_id,
            page = query.page,
            per_page = query.page_size,
            "fetching library words"
        );

        let payload: Option<LibraryPayload> = self
            .send_with_retry(|| self.client.get(&url).query(&params))
            .await?;
        let library = payload
            .ok_or(WordSourceError::LibraryNotFound(library_id))?
            .library;

        Ok(LibraryWords {
            words: library.words,
            counts: library.counts,
        })
    }

    async fn set_word_learned(
        &self,
        library_id: LibraryId,
        word_id: WordId,
        learned: bool,
    ) -> Result<bool, WordSourceError> {
        let action = if learned { "learn" } else { "unlearn" };
        let url = self.url(&format!("/words/{word_id}/{action}"));
        let body = serde_json::json!({ "library_id": library_id });

        let _: Option<serde_json::Value> = self
            .send_with_retry(|| self.client.post(&url).json(&body))
            .await?;
        Ok(true)
    }
}

fn query_params(query: &WordQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("per_page", query.page_size.to_string()),
    ];
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        params.push(("search", search.to_string()));
    }
    params
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_envelope_parses() {
        let json = r#"{
            "success": true,
            "data": {
                "library": {
                    "id": 1,
                    "name": "GRE",
                    "word_count": 2,
                    "learned_count": 1,
                    "unlearned_count": 1,
                    "words": [
                        {
                            "id": 10, "word": "laconic", "meaning": "terse",
                            "is_learned": true, "difficulty": "hard"
                        },
                        {
                            "id": 11, "word": "verbose", "meaning": "wordy",
                            "is_learned": false, "difficulty": "weird"
                        }
                    ]
                }
            }
        }"#;
        let envelope: Envelope<LibraryPayload> = serde_json::from_str(json).unwrap();
        let library = envelope.into_result().unwrap().unwrap().library;
        assert_eq!(library.words.len(), 2);
        assert!(library.words[0].is_learned);
        assert_eq!(library.words[1].difficulty, lexis_algo::Difficulty::Medium);
        assert_eq!(library.counts.learned_count, 1);
    }

    #[test]
    fn test_unsuccessful_envelope_is_an_error() {
        let json = r#"{"success": false, "error": "Library not found"}"#;
        let envelope: Envelope<LibraryPayload> = serde_json::from_str(json).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, WordSourceError::Api(ref msg) if msg == "Library not found"));
    }

    #[test]
    fn test_query_params() {
        let params = query_params(&WordQuery {
            page: 2,
            page_size: 50,
            search: Some("  ".into()),
        });
        assert_eq!(params.len(), 2);
        assert_eq!(params[1], ("per_page", "50".to_string()));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(reqwest::StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(normalize_base_url("http://x/api/ "), "http://x/api");
    }
}
