//! Word source seam
//!
//! The session manager reads vocabulary through [`WordSource`] and toggles the
//! learned flag through it. [`HttpWordSource`] talks to the REST backend;
//! [`InMemoryWordSource`] serves fixed libraries for tests and offline use.

mod http;
mod memory;

pub use http::{HttpWordSource, WordSourceConfig};
pub use memory::InMemoryWordSource;

use async_trait::async_trait;
use lexis_algo::{LibraryId, VocabularyEntry, WordId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when a session loads a whole library
pub const SESSION_PAGE_SIZE: u32 = 500;

#[derive(Debug, Error)]
pub enum WordSourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("library {0} not found")]
    LibraryNotFound(LibraryId),
    #[error("word {0} not found")]
    WordNotFound(WordId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
}

impl Default for WordQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: SESSION_PAGE_SIZE,
            search: None,
        }
    }
}

impl WordQuery {
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryCounts {
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub learned_count: u64,
    #[serde(default)]
    pub unlearned_count: u64,
}

impl LibraryCounts {
    /// Percentage of the library marked learned
    pub fn mastery(&self) -> f64 {
        if self.word_count == 0 {
            return 0.0;
        }
        self.learned_count as f64 / self.word_count as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryWords {
    pub words: Vec<VocabularyEntry>,
    pub counts: LibraryCounts,
}

#[async_trait]
pub trait WordSource: Send + Sync {
    async fn get_library_words(
        &self,
        library_id: LibraryId,
        query: WordQuery,
    ) -> Result<LibraryWords, WordSourceError>;

    /// Returns whether the backend accepted the change.
    async fn set_word_learned(
        &self,
        library_id: LibraryId,
        word_id: WordId,
        learned: bool,
    ) -> Result<bool, WordSourceError>;

    /// Learned words of the library
    async fn words_for_review(
        &self,
        library_id: LibraryId,
    ) -> Result<Vec<VocabularyEntry>, WordSourceError> {
        let library = self
            .get_library_words(library_id, WordQuery::default())
            .await?;
        Ok(library.words.into_iter().filter(|w| w.is_learned).collect())
    }
}
