//! Session manager
//!
//! Owns the single active study session of one learner, the learner's
//! progress, and the engine RNG. State sits behind a `parking_lot::Mutex`
//! whose guard is always dropped before an `.await`; the only asynchronous
//! steps are word-source calls and the deferred clear of a finished session.
//!
//! Starting a session replaces whatever session was installed before. Each
//! start takes a ticket from the start epoch; a start whose ticket is no
//! longer current when its fetch resolves (a newer start, an
//! [`abandon_pending_start`](SessionManager::abandon_pending_start) or a
//! [`logout`](SessionManager::logout)) is dropped with
//! [`LearningError::Cancelled`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lexis_algo::gamification::GamificationEngine;
use lexis_algo::{
    generate_questions, rng_from_seed, shuffle_with_anchor, AccuracyBlend, Advance,
    FlashcardMode, GamificationEvent, LearningStats, LibraryId, QuizQuestion, QuizRun,
    SessionSummary, StatsPatch, StudyMode, StudySession, UserLevel, VocabularyEntry, WordId,
};
use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{LearningError, Selection};
use crate::progress::{Progress, ProgressStore};
use crate::word_source::{LibraryCounts, WordQuery, WordSource, WordSourceError};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub request_timeout: Duration,
    pub clear_delay: Duration,
    pub accuracy_blend: AccuracyBlend,
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout,
            clear_delay: config.clear_delay,
            accuracy_blend: config.accuracy_blend,
            seed: config.seed,
        }
    }
}

/// Result of moving a card or question cursor forward
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Moved(usize),
    Finished(Box<SessionOutcome>),
    Inactive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub summary: SessionSummary,
    /// Everything the learner earned since the last drain, in order
    pub events: Vec<GamificationEvent>,
    pub learning_stats: LearningStats,
    pub level: UserLevel,
    pub persisted: bool,
}

struct ActiveSession {
    session: StudySession,
    quiz: Option<QuizRun>,
    learned_words: HashSet<WordId>,
}

struct State {
    active: Option<ActiveSession>,
    progress: Progress,
    pending_events: Vec<GamificationEvent>,
    rng: ChaCha8Rng,
}

struct Inner {
    words: Arc<dyn WordSource>,
    progress_store: ProgressStore,
    settings: SessionSettings,
    state: Mutex<State>,
    /// Held across snapshot and write so saves reach the store in order.
    /// Always taken before `state`.
    save_lock: Mutex<()>,
    start_epoch: AtomicU64,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Builds a manager and loads the learner's saved progress.
    pub fn load(
        words: Arc<dyn WordSource>,
        progress_store: ProgressStore,
        settings: SessionSettings,
    ) -> Result<Self, LearningError> {
        let progress = progress_store.load()?;
        Ok(Self::with_progress(words, progress_store, settings, progress))
    }

    pub fn with_progress(
        words: Arc<dyn WordSource>,
        progress_store: ProgressStore,
        settings: SessionSettings,
        progress: Progress,
    ) -> Self {
        let rng = rng_from_seed(settings.seed);
        Self {
            inner: Arc::new(Inner {
                words,
                progress_store,
                settings,
                state: Mutex::new(State {
                    active: None,
                    progress,
                    pending_events: Vec::new(),
                    rng,
                }),
                save_lock: Mutex::new(()),
                start_epoch: AtomicU64::new(0),
            }),
        }
    }

    // ==================== Session start ====================

    pub async fn start_flashcard_session(
        &self,
        library_id: LibraryId,
        mode: FlashcardMode,
        anchor: Option<WordId>,
    ) -> Result<StudySession, LearningError> {
        let ticket = self.next_ticket();
        let library = self
            .call(
                "get_library_words",
                self.inner
                    .words
                    .get_library_words(library_id, WordQuery::default()),
            )
            .await?;

        let words: Vec<VocabularyEntry> = library
            .words
            .into_iter()
            .filter(|w| mode.accepts(w))
            .collect();

        self.install(
            ticket,
            library_id,
            Selection::Flashcards(mode),
            words,
            Some(library.counts),
            |words, rng| {
                shuffle_with_anchor(words, anchor, rng);
                None
            },
        )
    }

    pub async fn start_quiz_session(
        &self,
        library_id: LibraryId,
        question_count: usize,
    ) -> Result<StudySession, LearningError> {
        let ticket = self.next_ticket();
        let page_size = u32::try_from(question_count).unwrap_or(u32::MAX);
        let library = self
            .call(
                "get_library_words",
                self.inner
                    .words
                    .get_library_words(library_id, WordQuery::first_page(page_size)),
            )
            .await?;

        let mut words = library.words;
        words.truncate(question_count);
        if !words.is_empty() && words.len() < question_count {
            warn!(
                library_id,
                requested = question_count,
                available = words.len(),
                "fewer words available than requested for quiz"
            );
        }

        self.install(
            ticket,
            library_id,
            Selection::Quiz,
            words,
            Some(library.counts),
            |words, rng| Some(QuizRun::new(generate_questions(words, rng))),
        )
    }

    /// Reviews the learned words of a library in random order.
    pub async fn start_review_session(
        &self,
        library_id: LibraryId,
    ) -> Result<StudySession, LearningError> {
        let ticket = self.next_ticket();
        let words = self
            .call("words_for_review", self.inner.words.words_for_review(library_id))
            .await?;

        self.install(ticket, library_id, Selection::Review, words, None, |words, rng| {
            shuffle_with_anchor(words, None, rng);
            None
        })
    }

    /// Invalidates any start that is still waiting on the word source.
    pub fn abandon_pending_start(&self) {
        let _state = self.inner.state.lock();
        let epoch = self.inner.start_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch, "pending session start abandoned");
    }

    fn next_ticket(&self) -> u64 {
        self.inner.start_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn install<F>(
        &self,
        ticket: u64,
        library_id: LibraryId,
        selection: Selection,
        mut words: Vec<VocabularyEntry>,
        counts: Option<LibraryCounts>,
        prepare: F,
    ) -> Result<StudySession, LearningError>
    where
        F: FnOnce(&mut Vec<VocabularyEntry>, &mut ChaCha8Rng) -> Option<QuizRun>,
    {
        let mut state = self.inner.state.lock();
        if self.inner.start_epoch.load(Ordering::SeqCst) != ticket {
            debug!(library_id, ticket, "discarding superseded session start");
            return Err(LearningError::Cancelled);
        }
        if words.is_empty() {
            warn!(library_id, mode = %selection, "no words available for session");
            return Err(LearningError::EmptySelection { mode: selection });
        }

        let quiz = prepare(&mut words, &mut state.rng);
        let id = Uuid::new_v4().to_string();
        let session = StudySession::new(id, library_id, selection.study_mode(), words, Utc::now())
            .ok_or(LearningError::EmptySelection { mode: selection })?;

        if let Some(previous) = state.active.as_ref().filter(|a| a.session.is_active()) {
            info!(
                session_id = previous.session.id(),
                "replacing unfinished session"
            );
        }

        if let Some(counts) = counts.filter(|c| c.word_count > 0) {
            let patch = StatsPatch {
                vocabulary_mastery: Some(counts.mastery()),
                ..StatsPatch::default()
            };
            let events = state.progress.gamification.update_stats(&patch, Utc::now());
            log_events(&events);
            state.pending_events.extend(events);
        }

        info!(
            session_id = session.id(),
            library_id,
            mode = %selection,
            words = session.words().len(),
            "study session started"
        );

        let snapshot = session.clone();
        state.active = Some(ActiveSession {
            session,
            quiz,
            learned_words: HashSet::new(),
        });
        Ok(snapshot)
    }

    // ==================== Flashcards ====================

    /// Marks a word learned. Returns `false` when no session is active or the
    /// word source refused the change. Quiz sessions are scored by their
    /// questions only, so marking a word there is an
    /// [`InvalidSessionOperation`](LearningError::InvalidSessionOperation).
    pub async fn mark_word_known(&self, word_id: WordId) -> Result<bool, LearningError> {
        self.mark_word(word_id, true).await
    }

    pub async fn mark_word_unknown(&self, word_id: WordId) -> Result<bool, LearningError> {
        self.mark_word(word_id, false).await
    }

    async fn mark_word(&self, word_id: WordId, known: bool) -> Result<bool, LearningError> {
        let Some((session_id, library_id, in_quiz)) = self.with_active(|active| {
            (
                active.session.id().to_string(),
                active.session.library_id(),
                active.quiz.is_some(),
            )
        }) else {
            return Ok(false);
        };
        if in_quiz {
            return Err(LearningError::InvalidSessionOperation("mark words during a quiz"));
        }

        let accepted = self
            .call(
                "set_word_learned",
                self.inner.words.set_word_learned(library_id, word_id, known),
            )
            .await?;
        if !accepted {
            warn!(word_id, known, "word source rejected learned flag change");
            return Ok(false);
        }

        let newly_learned = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let Some(active) = state
                .active
                .as_mut()
                .filter(|a| a.session.id() == session_id && a.session.is_active())
            else {
                return Ok(false);
            };
            active.session.record_answer(known);

            let was_learned = active
                .session
                .words()
                .iter()
                .find(|w| w.id == word_id)
                .is_some_and(|w| w.is_learned);
            let newly_learned = known && !was_learned && active.learned_words.insert(word_id);
            if newly_learned {
                let events = state.progress.gamification.record_word_learned(Utc::now());
                log_events(&events);
                state.pending_events.extend(events);
            }
            newly_learned
        };

        debug!(word_id, known, newly_learned, "flashcard answered");
        if newly_learned {
            self.persist();
        }
        Ok(true)
    }

    /// Moves to the next card; on the last card the session ends.
    pub fn next_card(&self) -> Step {
        let advance = {
            let mut state = self.inner.state.lock();
            match state.active.as_mut() {
                Some(active) => active.session.advance(),
                None => Advance::Inactive,
            }
        };
        match advance {
            Advance::Moved(index) => Step::Moved(index),
            Advance::ReachedEnd => self.finish_step(),
            Advance::Inactive => Step::Inactive,
        }
    }

    /// Steps back one card; a no-op on the first card.
    pub fn previous_card(&self) -> bool {
        let mut state = self.inner.state.lock();
        state
            .active
            .as_mut()
            .is_some_and(|active| active.session.retreat())
    }

    // ==================== Quiz ====================

    /// Answers the current question. `None` when there is no active quiz or
    /// the question was already answered.
    pub fn submit_answer(&self, answer: &str) -> Option<bool> {
        let mut state = self.inner.state.lock();
        let active = state.active.as_mut().filter(|a| a.session.is_active())?;
        let correct = active.quiz.as_mut()?.submit(answer)?;
        active.session.record_answer(correct);
        debug!(
            session_id = active.session.id(),
            correct,
            answered = active.session.total_answered(),
            "quiz answer recorded"
        );
        Some(correct)
    }

    /// Moves to the next question; after the last question the session ends.
    pub fn next_question(&self) -> Step {
        let advance = {
            let mut state = self.inner.state.lock();
            match state.active.as_mut() {
                Some(ActiveSession {
                    session,
                    quiz: Some(quiz),
                    ..
                }) if session.is_active() => {
                    let advance = quiz.advance();
                    if let Advance::Moved(index) = advance {
                        session.seek(index);
                    }
                    advance
                }
                _ => Advance::Inactive,
            }
        };
        match advance {
            Advance::Moved(index) => Step::Moved(index),
            Advance::ReachedEnd => self.finish_step(),
            Advance::Inactive => Step::Inactive,
        }
    }

    // ==================== Session end ====================

    /// Completes the active session, folds it into the learner's progress,
    /// saves, and schedules the session to be cleared. `None` when there is
    /// no unfinished session.
    pub fn end_session(&self) -> Option<SessionOutcome> {
        let now = Utc::now();
        let (mut outcome, session_id) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let active = state.active.as_mut()?;
            if !active.session.complete(now) {
                return None;
            }
            let summary = active.session.summary();
            let session_id = active.session.id().to_string();

            state.progress.learning_stats.record_session(
                &summary,
                self.inner.settings.accuracy_blend,
                now,
            );
            let streak = state.progress.learning_stats.streak_days;
            let events = state
                .progress
                .gamification
                .record_session(&summary, streak, now);
            log_events(&events);

            let mut all_events = std::mem::take(&mut state.pending_events);
            all_events.extend(events);

            let outcome = SessionOutcome {
                summary,
                events: all_events,
                learning_stats: state.progress.learning_stats.clone(),
                level: state.progress.gamification.level().clone(),
                persisted: false,
            };
            (outcome, session_id)
        };

        info!(
            session_id = %session_id,
            accuracy = outcome.summary.accuracy,
            correct = outcome.summary.correct_answers,
            answered = outcome.summary.total_answered,
            "study session completed"
        );

        outcome.persisted = self.persist();
        self.schedule_clear(session_id);
        Some(outcome)
    }

    fn finish_step(&self) -> Step {
        match self.end_session() {
            Some(outcome) => Step::Finished(Box::new(outcome)),
            None => Step::Inactive,
        }
    }

    fn schedule_clear(&self, session_id: String) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(session_id = %session_id, "no runtime, finished session stays installed");
            return;
        };
        let inner = Arc::clone(&self.inner);
        let delay = inner.settings.clear_delay;
        handle.spawn(async move {
            sleep(delay).await;
            let mut state = inner.state.lock();
            let finished = state
                .active
                .as_ref()
                .is_some_and(|a| a.session.id() == session_id && a.session.is_completed());
            if finished {
                state.active = None;
                debug!(session_id = %session_id, "finished session cleared");
            }
        });
    }

    // ==================== Progress ====================

    /// Drops the session and resets in-memory progress. Saved progress is
    /// left in the store.
    pub fn logout(&self) {
        let mut state = self.inner.state.lock();
        self.inner.start_epoch.fetch_add(1, Ordering::SeqCst);
        state.active = None;
        state.progress = Progress::default();
        state.pending_events.clear();
        info!(user_id = self.inner.progress_store.user_id(), "logged out");
    }

    /// Replaces in-memory progress with what the store holds.
    pub fn reload_progress(&self) -> Result<(), LearningError> {
        let _ordered = self.inner.save_lock.lock();
        let progress = self.inner.progress_store.load()?;
        self.inner.state.lock().progress = progress;
        Ok(())
    }

    pub fn add_xp(&self, amount: u64, reason: &str) -> Vec<GamificationEvent> {
        self.mutate_gamification(|engine, _| engine.add_xp(amount, reason))
    }

    pub fn update_stats(&self, patch: &StatsPatch) -> Vec<GamificationEvent> {
        self.mutate_gamification(|engine, now| engine.update_stats(patch, now))
    }

    pub fn record_story_created(&self) -> Vec<GamificationEvent> {
        self.mutate_gamification(|engine, now| engine.record_story_created(now))
    }

    fn mutate_gamification<F>(&self, f: F) -> Vec<GamificationEvent>
    where
        F: FnOnce(&mut GamificationEngine, DateTime<Utc>) -> Vec<GamificationEvent>,
    {
        let events = f(&mut self.inner.state.lock().progress.gamification, Utc::now());
        log_events(&events);
        self.persist();
        events
    }

    /// Saves the current progress; failures are logged.
    ///
    /// The snapshot is taken after the save lock is acquired, so a save that
    /// started later never lands before an earlier one and the store always
    /// ends up holding the newest progress.
    pub fn persist(&self) -> bool {
        let _ordered = self.inner.save_lock.lock();
        let snapshot = self.inner.state.lock().progress.clone();
        self.save(&snapshot)
    }

    fn save(&self, progress: &Progress) -> bool {
        match self.inner.progress_store.save(progress) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    user_id = self.inner.progress_store.user_id(),
                    error = %e,
                    "failed to save progress"
                );
                false
            }
        }
    }

    /// Events produced outside a session end (word learned, mastery update),
    /// drained.
    pub fn take_events(&self) -> Vec<GamificationEvent> {
        std::mem::take(&mut self.inner.state.lock().pending_events)
    }

    // ==================== Accessors ====================

    pub fn current_session(&self) -> Option<StudySession> {
        self.with_any(|active| active.session.clone())
    }

    pub fn current_word(&self) -> Option<VocabularyEntry> {
        self.with_active(|active| active.session.current_word().cloned())
            .flatten()
    }

    pub fn current_quiz(&self) -> Option<QuizRun> {
        self.with_any(|active| active.quiz.clone()).flatten()
    }

    pub fn current_question(&self) -> Option<QuizQuestion> {
        self.with_active(|active| active.quiz.as_ref().and_then(|q| q.current().cloned()))
            .flatten()
    }

    pub fn has_active_session(&self) -> bool {
        self.with_active(|_| ()).is_some()
    }

    pub fn mode(&self) -> Option<StudyMode> {
        self.with_any(|active| active.session.mode())
    }

    pub fn progress(&self) -> Progress {
        self.inner.state.lock().progress.clone()
    }

    pub fn learning_stats(&self) -> LearningStats {
        self.inner.state.lock().progress.learning_stats.clone()
    }

    pub fn level(&self) -> UserLevel {
        self.inner.state.lock().progress.gamification.level().clone()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    fn with_any<T>(&self, f: impl FnOnce(&ActiveSession) -> T) -> Option<T> {
        let state = self.inner.state.lock();
        state.active.as_ref().map(f)
    }

    fn with_active<T>(&self, f: impl FnOnce(&ActiveSession) -> T) -> Option<T> {
        let state = self.inner.state.lock();
        state
            .active
            .as_ref()
            .filter(|a| a.session.is_active())
            .map(f)
    }

    async fn call<T, F>(&self, op: &'static str, fut: F) -> Result<T, LearningError>
    where
        F: Future<Output = Result<T, WordSourceError>>,
    {
        let limit = self.inner.settings.request_timeout;
        match timeout(limit, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(op, error = %e, "word source call failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(op, timeout_ms = limit.as_millis() as u64, "word source call timed out");
                Err(LearningError::Timeout(limit))
            }
        }
    }
}

fn log_events(events: &[GamificationEvent]) {
    for event in events {
        match event {
            GamificationEvent::LevelUp { level, title } => {
                info!(level, title = %title, "level up");
            }
            GamificationEvent::AchievementUnlocked { id, title, xp_reward } => {
                info!(achievement = %id, title = %title, xp_reward, "achievement unlocked");
            }
            GamificationEvent::XpAwarded { amount, reason } => {
                debug!(amount, reason = %reason, "xp awarded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::word_source::InMemoryWordSource;

    fn manager(words: Vec<VocabularyEntry>) -> SessionManager {
        let source = Arc::new(InMemoryWordSource::new().with_library(1, words));
        let store = ProgressStore::new(Arc::new(MemoryStore::new()), "test");
        let settings = SessionSettings {
            seed: Some(7),
            ..SessionSettings::default()
        };
        SessionManager::with_progress(source, store, settings, Progress::default())
    }

    fn library(n: i64) -> Vec<VocabularyEntry> {
        (1..=n)
            .map(|i| VocabularyEntry::new(i, format!("term{i}"), format!("meaning {i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_anchor_word_comes_first() {
        let manager = manager(library(10));
        let session = manager
            .start_flashcard_session(1, FlashcardMode::Mixed, Some(7))
            .await
            .unwrap();
        assert_eq!(session.words()[0].id, 7);
        assert_eq!(session.words().len(), 10);
        assert_eq!(session.mode(), StudyMode::Flashcards);
    }

    #[tokio::test]
    async fn test_previous_card_at_start_is_noop() {
        let manager = manager(library(3));
        manager
            .start_flashcard_session(1, FlashcardMode::Mixed, None)
            .await
            .unwrap();
        assert!(!manager.previous_card());
        assert_eq!(manager.next_card(), Step::Moved(1));
        assert!(manager.previous_card());
        assert_eq!(manager.current_session().unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn test_end_session_without_answers() {
        let manager = manager(library(2));
        manager
            .start_flashcard_session(1, FlashcardMode::Mixed, None)
            .await
            .unwrap();
        let outcome = manager.end_session().unwrap();
        assert_eq!(outcome.summary.accuracy, 0.0);
        assert!(outcome.persisted);
        assert!(manager.end_session().is_none());
        assert!(!manager.has_active_session());
    }

    #[test]
    fn test_operations_without_session_are_noops() {
        let manager = manager(library(2));
        assert_eq!(manager.next_card(), Step::Inactive);
        assert_eq!(manager.next_question(), Step::Inactive);
        assert!(!manager.previous_card());
        assert_eq!(manager.submit_answer("x"), None);
        assert!(manager.end_session().is_none());
    }

    #[tokio::test]
    async fn test_mastery_follows_library_counts() {
        let mut words = library(4);
        words[0].is_learned = true;
        let manager = manager(words);
        manager
            .start_flashcard_session(1, FlashcardMode::Mixed, None)
            .await
            .unwrap();
        let progress = manager.progress();
        assert!((progress.gamification.stats().vocabulary_mastery - 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_logout_resets_progress() {
        let manager = manager(library(2));
        manager.add_xp(40, "bonus");
        manager
            .start_flashcard_session(1, FlashcardMode::Mixed, None)
            .await
            .unwrap();
        manager.logout();
        assert!(manager.current_session().is_none());
        assert_eq!(manager.level().total_xp, 0);

        manager.reload_progress().unwrap();
        assert_eq!(manager.level().total_xp, 40);
    }
}
