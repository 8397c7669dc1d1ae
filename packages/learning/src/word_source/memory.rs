use std::collections::HashMap;

use async_trait::async_trait;
use lexis_algo::{LibraryId, VocabularyEntry, WordId};
use parking_lot::RwLock;

use super::{LibraryCounts, LibraryWords, WordQuery, WordSource, WordSourceError};

#[derive(Debug, Default)]
pub struct InMemoryWordSource {
    libraries: RwLock<HashMap<LibraryId, Vec<VocabularyEntry>>>,
}

impl InMemoryWordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(self, library_id: LibraryId, words: Vec<VocabularyEntry>) -> Self {
        self.insert_library(library_id, words);
        self
    }

    pub fn insert_library(&self, library_id: LibraryId, words: Vec<VocabularyEntry>) {
        self.libraries.write().insert(library_id, words);
    }

    pub fn word(&self, library_id: LibraryId, word_id: WordId) -> Option<VocabularyEntry> {
        self.libraries
            .read()
            .get(&library_id)?
            .iter()
            .find(|w| w.id == word_id)
            .cloned()
    }
}

fn matches_search(word: &VocabularyEntry, search: &str) -> bool {
    let needle = search.to_lowercase();
    word.term.to_lowercase().contains(&needle) || word.meaning.to_lowercase().contains(&needle)
}

#[async_trait]
impl WordSource for InMemoryWordSource {
    async fn get_library_words(
        &self,
        library_id: LibraryId,
        query: WordQuery,
    ) -> Result<LibraryWords, WordSourceError> {
        let libraries = self.libraries.read();
        let all = libraries
            .get(&library_id)
            .ok_or(WordSourceError::LibraryNotFound(library_id))?;

        let learned = all.iter().filter(|w| w.is_learned).count() as u64;
        let counts = LibraryCounts {
            word_count: all.len() as u64,
            learned_count: learned,
            unlearned_count: all.len() as u64 - learned,
        };

        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let page_size = query.page_size.max(1) as usize;
        let skip = query.page.saturating_sub(1) as usize * page_size;
        let words = all
            .iter()
            .filter(|w| search.map_or(true, |s| matches_search(w, s)))
            .skip(skip)
            .take(page_size)
            .cloned()
            .collect();

        Ok(LibraryWords { words, counts })
    }

    async fn set_word_learned(
        &self,
        library_id: LibraryId,
        word_id: WordId,
        learned: bool,
    ) -> Result<bool, WordSourceError> {
        let mut libraries = self.libraries.write();
        let words = libraries
            .get_mut(&library_id)
            .ok_or(WordSourceError::LibraryNotFound(library_id))?;
        let word = words
            .iter_mut()
            .find(|w| w.id == word_id)
            .ok_or(WordSourceError::WordNotFound(word_id))?;
        word.is_learned = learned;
        Ok(true)
    }
}
