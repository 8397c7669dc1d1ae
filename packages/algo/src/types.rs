//! Common Types and Constants
//!
//! Shared data structures used across the quiz, session and gamification modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Marker substituted for the target term in fill-blank questions
pub const BLANK_MARKER: &str = "_____";

/// Maximum number of wrong options offered by a multiple-choice question
pub const MAX_DISTRACTORS: usize = 3;

/// Answer string of a true/false question stating the real meaning
pub const TRUE_ANSWER: &str = "True";

/// Answer string of a true/false question stating a substituted meaning
pub const FALSE_ANSWER: &str = "False";

pub type WordId = i64;
pub type LibraryId = i64;

// ==================== Vocabulary ====================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

// The backend stores difficulty as free text; anything unrecognised is medium.
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Difficulty::parse).unwrap_or_default())
    }
}

/// A vocabulary entry as delivered by the word source.
///
/// Field names follow the backend's JSON (`word`, `is_learned`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: WordId,
    #[serde(rename = "word")]
    pub term: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonym: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antonym: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(rename = "is_learned", default)]
    pub is_learned: bool,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl VocabularyEntry {
    pub fn new(id: WordId, term: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            id,
            term: term.into(),
            meaning: meaning.into(),
            pronunciation: None,
            synonym: None,
            antonym: None,
            example: None,
            is_learned: false,
            difficulty: Difficulty::Medium,
        }
    }

    pub fn learned(mut self, is_learned: bool) -> Self {
        self.is_learned = is_learned;
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Example sentence, ignoring blank strings
    pub fn example_sentence(&self) -> Option<&str> {
        self.example.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

// ==================== Study Modes ====================

/// Kind of study session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    Flashcards,
    Quiz,
    Review,
}

/// Word selection used when starting a flashcard session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashcardMode {
    /// Learned words only
    Revision,
    /// Unlearned words only
    New,
    /// Every word in the library
    Mixed,
}

impl FlashcardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revision => "revision",
            Self::New => "new",
            Self::Mixed => "mixed",
        }
    }

    pub fn accepts(&self, entry: &VocabularyEntry) -> bool {
        match self {
            Self::Revision => entry.is_learned,
            Self::New => !entry.is_learned,
            Self::Mixed => true,
        }
    }
}

impl std::fmt::Display for FlashcardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlashcardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revision" => Ok(Self::Revision),
            "new" => Ok(Self::New),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!("unknown flashcard mode: {other}")),
        }
    }
}

// ==================== Quiz Types ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    FillBlank,
    TrueFalse,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::MultipleChoice,
        QuestionType::FillBlank,
        QuestionType::TrueFalse,
    ];

    /// Suffix used in question ids
    pub fn id_suffix(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "mc",
            Self::FillBlank => "fb",
            Self::TrueFalse => "tf",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub word: VocabularyEntry,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl QuizQuestion {
    pub fn is_answered(&self) -> bool {
        self.user_answer.is_some()
    }

    /// Trimmed, case-insensitive comparison against the correct answer
    pub fn matches(&self, answer: &str) -> bool {
        normalize_answer(answer) == normalize_answer(&self.correct_answer)
    }

    /// Records the first answer. Later answers are ignored and return `None`.
    pub fn answer(&mut self, answer: &str) -> Option<bool> {
        if self.is_answered() {
            return None;
        }
        let is_correct = self.matches(answer);
        self.user_answer = Some(answer.to_string());
        self.is_correct = Some(is_correct);
        Some(is_correct)
    }
}

pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}
