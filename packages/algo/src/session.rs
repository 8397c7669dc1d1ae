//! Study session state machine
//!
//! `StudySession` tracks the cursor and answer counters of one flashcard,
//! quiz or review run; `QuizRun` holds the generated questions of a quiz and
//! its own cursor. Both are synchronous and own no I/O.
//!
//! Lifecycle: `Active -> Completed`, one way. Advancing past the last word
//! reports `Advance::ReachedEnd` instead of moving the cursor; the owner is
//! expected to complete the session at that point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LibraryId, QuizQuestion, StudyMode, VocabularyEntry};

/// Result of moving a cursor forward
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    ReachedEnd,
    Inactive,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    id: String,
    library_id: LibraryId,
    mode: StudyMode,
    words: Vec<VocabularyEntry>,
    current_index: usize,
    correct_answers: u32,
    total_answered: u32,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    is_completed: bool,
}

impl StudySession {
    /// Returns `None` for an empty word list; a session always has a current word.
    pub fn new(
        id: impl Into<String>,
        library_id: LibraryId,
        mode: StudyMode,
        words: Vec<VocabularyEntry>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            library_id,
            mode,
            words,
            current_index: 0,
            correct_answers: 0,
            total_answered: 0,
            start_time: now,
            end_time: None,
            is_completed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn library_id(&self) -> LibraryId {
        self.library_id
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn words(&self) -> &[VocabularyEntry] {
        &self.words
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_word(&self) -> Option<&VocabularyEntry> {
        self.words.get(self.current_index)
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn total_answered(&self) -> u32 {
        self.total_answered
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.words.len()
    }

    /// Counts one answer. Ignored once the session is completed.
    pub fn record_answer(&mut self, correct: bool) -> bool {
        if self.is_completed {
            return false;
        }
        self.total_answered = self.total_answered.saturating_add(1);
        if correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        }
        true
    }

    pub fn advance(&mut self) -> Advance {
        if self.is_completed {
            return Advance::Inactive;
        }
        if self.is_last() {
            return Advance::ReachedEnd;
        }
        self.current_index += 1;
        Advance::Moved(self.current_index)
    }

    /// Steps back one word; no-op at index 0.
    pub fn retreat(&mut self) -> bool {
        if self.is_completed || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Keeps the word cursor aligned with an external cursor (the quiz).
    pub fn seek(&mut self, index: usize) -> bool {
        if self.is_completed || index >= self.words.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    /// Marks the session completed. Returns `false` if it already was.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_completed {
            return false;
        }
        self.is_completed = true;
        self.end_time = Some(now);
        true
    }

    /// Accuracy in percent; 0 when nothing was answered
    pub fn accuracy(&self) -> f64 {
        if self.total_answered == 0 {
            return 0.0;
        }
        self.correct_answers as f64 / self.total_answered as f64 * 100.0
    }

    pub fn duration_minutes(&self) -> f64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        ((end - self.start_time).num_milliseconds().max(0) as f64) / 60_000.0
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            library_id: self.library_id,
            mode: self.mode,
            word_count: self.words.len(),
            correct_answers: self.correct_answers,
            total_answered: self.total_answered,
            accuracy: self.accuracy(),
            duration_minutes: self.duration_minutes(),
            started_at: self.start_time,
            ended_at: self.end_time,
        }
    }
}

/// Snapshot of a finished (or finishing) session, used to fold results into stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub library_id: LibraryId,
    pub mode: StudyMode,
    pub word_count: usize,
    pub correct_answers: u32,
    pub total_answered: u32,
    pub accuracy: f64,
    pub duration_minutes: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    /// A quiz where every question was answered correctly
    pub fn is_perfect_quiz(&self) -> bool {
        self.mode == StudyMode::Quiz
            && self.total_answered > 0
            && self.correct_answers == self.total_answered
            && self.total_answered as usize >= self.word_count
    }
}

// ==================== Quiz Run ====================

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRun {
    questions: Vec<QuizQuestion>,
    cursor: usize,
}

impl QuizRun {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self { questions, cursor: 0 }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.cursor)
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_answered()).count()
    }

    /// Answers the current question. `None` if there is no question or it
    /// was already answered.
    pub fn submit(&mut self, answer: &str) -> Option<bool> {
        self.questions.get_mut(self.cursor)?.answer(answer)
    }

    pub fn advance(&mut self) -> Advance {
        if self.questions.is_empty() {
            return Advance::Inactive;
        }
        if self.cursor + 1 >= self.questions.len() {
            return Advance::ReachedEnd;
        }
        self.cursor += 1;
        Advance::Moved(self.cursor)
    }
}
