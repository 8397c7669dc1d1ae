//! # lexis-algo - vocabulary study core
//!
//! Pure, synchronous logic shared by every front end:
//!
//! - **Quiz generation** - one multiple-choice, fill-blank or true/false
//!   question per word
//! - **Study sessions** - cursor, answer counters and the one-way
//!   `Active -> Completed` lifecycle
//! - **Learning stats** - totals, streaks, weekly progress and accuracy blending
//! - **Gamification** - XP, levels and the achievement catalog
//!
//! ## Module structure
//!
//! - [`types`] - vocabulary entries, modes and quiz questions
//! - [`shuffle`] - Fisher–Yates shuffling and sampling
//! - [`quiz`] - question generator
//! - [`session`] - study session state machine
//! - [`stats`] - learning statistics
//! - [`gamification`] - levels, achievements and events
//!
//! ## Example
//!
//! ```rust
//! use lexis_algo::{generate_questions, rng_from_seed, VocabularyEntry};
//!
//! let words = vec![
//!     VocabularyEntry::new(1, "laconic", "using few words"),
//!     VocabularyEntry::new(2, "garrulous", "excessively talkative"),
//! ];
//! let mut rng = rng_from_seed(Some(7));
//! let quiz = generate_questions(&words, &mut rng);
//! assert_eq!(quiz.len(), 2);
//! ```

pub mod gamification;
pub mod quiz;
pub mod session;
pub mod shuffle;
pub mod stats;
pub mod types;

pub use types::*;

pub use gamification::{
    Achievement, GamificationEngine, GamificationEvent, GamificationStats, StatsPatch, UserLevel,
};
pub use quiz::generate_questions;
pub use session::{Advance, QuizRun, SessionSummary, StudySession};
pub use shuffle::{rng_from_seed, shuffle_with_anchor};
pub use stats::{AccuracyBlend, LearningStats};
