use std::time::Duration;

use lexis_algo::{FlashcardMode, StudyMode};
use thiserror::Error;

use crate::storage::StorageError;
use crate::word_source::WordSourceError;

/// Selection that produced no words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Flashcards(FlashcardMode),
    Quiz,
    Review,
}

impl Selection {
    pub fn study_mode(&self) -> StudyMode {
        match self {
            Selection::Flashcards(_) => StudyMode::Flashcards,
            Selection::Quiz => StudyMode::Quiz,
            Selection::Review => StudyMode::Review,
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Flashcards(mode) => write!(f, "flashcards ({mode})"),
            Selection::Quiz => f.write_str("quiz"),
            Selection::Review => f.write_str("review"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LearningError {
    #[error("no words available for {mode}")]
    EmptySelection { mode: Selection },
    #[error("collaborator failed: {0}")]
    CollaboratorFailure(String),
    #[error("collaborator timed out after {0:?}")]
    Timeout(Duration),
    #[error("session start was superseded")]
    Cancelled,
    #[error("invalid session operation: {0}")]
    InvalidSessionOperation(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<WordSourceError> for LearningError {
    fn from(err: WordSourceError) -> Self {
        LearningError::CollaboratorFailure(err.to_string())
    }
}

impl LearningError {
    /// Message suitable for showing to the learner.
    pub fn user_message(&self) -> String {
        match self {
            LearningError::EmptySelection { mode } => match mode {
                Selection::Flashcards(FlashcardMode::Revision) => {
                    "No learned words to revise yet. Mark some words as learned first.".to_string()
                }
                Selection::Flashcards(FlashcardMode::New) => {
                    "All words in this library are already learned.".to_string()
                }
                _ => "This library has no words to study.".to_string(),
            },
            LearningError::CollaboratorFailure(_) | LearningError::Timeout(_) => {
                "Failed to load words. Please try again.".to_string()
            }
            LearningError::Cancelled => "Session start was cancelled.".to_string(),
            LearningError::InvalidSessionOperation(op) => format!("Cannot {op} right now."),
            LearningError::Storage(_) => "Progress could not be saved.".to_string(),
        }
    }
}
