#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lexis_algo::{LibraryId, VocabularyEntry, WordId};
use tokio::sync::Semaphore;

use lexis_learning::storage::StorageResult;
use lexis_learning::word_source::LibraryWords;
use lexis_learning::{
    InMemoryWordSource, MemoryStore, Progress, ProgressStore, SessionManager, SessionSettings,
    StateStore, WordQuery, WordSource, WordSourceError,
};

pub const LIBRARY_ID: LibraryId = 1;

/// One learned and one unlearned word
pub fn fixture_words() -> Vec<VocabularyEntry> {
    vec![
        VocabularyEntry::new(1, "laconic", "using very few words").learned(true),
        VocabularyEntry::new(2, "verbose", "using more words than needed")
            .with_example("His verbose report ran to forty pages."),
    ]
}

pub fn numbered_words(n: i64) -> Vec<VocabularyEntry> {
    (1..=n)
        .map(|i| VocabularyEntry::new(i, format!("term{i}"), format!("meaning {i}")))
        .collect()
}

pub fn settings(seed: u64) -> SessionSettings {
    SessionSettings {
        seed: Some(seed),
        ..SessionSettings::default()
    }
}

pub fn manager_with(source: Arc<dyn WordSource>, seed: u64) -> (SessionManager, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let progress = ProgressStore::new(store.clone(), "tester");
    let manager =
        SessionManager::with_progress(source, progress, settings(seed), Progress::default());
    (manager, store)
}

pub fn fixture_manager() -> (SessionManager, Arc<InMemoryWordSource>) {
    let source = Arc::new(InMemoryWordSource::new().with_library(LIBRARY_ID, fixture_words()));
    let (manager, _) = manager_with(source.clone(), 42);
    (manager, source)
}

// ============================================================================
// Word sources with scripted behavior
// ============================================================================

pub struct FailingWordSource;

#[async_trait]
impl WordSource for FailingWordSource {
    async fn get_library_words(
        &self,
        _library_id: LibraryId,
        _query: WordQuery,
    ) -> Result<LibraryWords, WordSourceError> {
        Err(WordSourceError::Api("backend unavailable".into()))
    }

    async fn set_word_learned(
        &self,
        _library_id: LibraryId,
        _word_id: WordId,
        _learned: bool,
    ) -> Result<bool, WordSourceError> {
        Err(WordSourceError::Api("backend unavailable".into()))
    }
}

/// Never answers.
pub struct HangingWordSource;

#[async_trait]
impl WordSource for HangingWordSource {
    async fn get_library_words(
        &self,
        _library_id: LibraryId,
        _query: WordQuery,
    ) -> Result<LibraryWords, WordSourceError> {
        std::future::pending().await
    }

    async fn set_word_learned(
        &self,
        _library_id: LibraryId,
        _word_id: WordId,
        _learned: bool,
    ) -> Result<bool, WordSourceError> {
        std::future::pending().await
    }
}

/// Holds fetches of one library until [`GatedWordSource::open`] is called.
pub struct GatedWordSource {
    inner: InMemoryWordSource,
    gated_library: LibraryId,
    gate: Semaphore,
}

impl GatedWordSource {
    pub fn new(inner: InMemoryWordSource, gated_library: LibraryId) -> Self {
        Self {
            inner,
            gated_library,
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl WordSource for GatedWordSource {
    async fn get_library_words(
        &self,
        library_id: LibraryId,
        query: WordQuery,
    ) -> Result<LibraryWords, WordSourceError> {
        if library_id == self.gated_library {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| WordSourceError::Api(e.to_string()))?;
        }
        self.inner.get_library_words(library_id, query).await
    }

    async fn set_word_learned(
        &self,
        library_id: LibraryId,
        word_id: WordId,
        learned: bool,
    ) -> Result<bool, WordSourceError> {
        self.inner.set_word_learned(library_id, word_id, learned).await
    }
}

pub const CLEAR_DELAY: Duration = Duration::from_secs(3);

// ============================================================================
// Stores with scripted behavior
// ============================================================================

/// Memory store that, once armed, sleeps inside the next write of one key.
pub struct StallingStore {
    inner: MemoryStore,
    stalled_key: &'static str,
    delay: Duration,
    armed: AtomicBool,
    stalled: AtomicBool,
}

impl StallingStore {
    pub fn new(stalled_key: &'static str, delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            stalled_key,
            delay,
            armed: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Blocks until a writer is sleeping inside the stalled write.
    pub fn wait_until_stalled(&self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !self.stalled.load(Ordering::SeqCst) {
            assert!(Instant::now() < deadline, "no write reached {}", self.stalled_key);
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl StateStore for StallingStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, json: &str) -> StorageResult<()> {
        if key.ends_with(self.stalled_key) && self.armed.swap(false, Ordering::SeqCst) {
            self.stalled.store(true, Ordering::SeqCst);
            std::thread::sleep(self.delay);
        }
        self.inner.save(key, json)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }
}
