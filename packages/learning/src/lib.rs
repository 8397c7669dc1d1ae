//! # lexis-learning
//!
//! Runs study sessions against a word source and keeps each learner's
//! progress: learning stats, XP, levels and achievements.

pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod pronunciation;
pub mod session;
pub mod storage;
pub mod word_source;

pub use config::Config;
pub use error::{LearningError, Selection};
pub use progress::{Progress, ProgressStore};
pub use session::{SessionManager, SessionOutcome, SessionSettings, Step};
pub use storage::{JsonFileStore, MemoryStore, StateStore, StorageError};
pub use word_source::{HttpWordSource, InMemoryWordSource, WordQuery, WordSource, WordSourceError};
