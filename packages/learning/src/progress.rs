//! Persisted learner progress
//!
//! Four JSON snapshots per user: learning stats, level, gamification stats
//! and achievements. Keys are `<user>.<name>` so several users can share one
//! store.

use std::sync::Arc;

use lexis_algo::gamification::{Achievement, GamificationEngine, GamificationStats, UserLevel};
use lexis_algo::LearningStats;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::storage::{StateStore, StorageResult};

pub const LEARNING_STATS_KEY: &str = "learningStats";
pub const USER_LEVEL_KEY: &str = "userLevel";
pub const GAMIFICATION_STATS_KEY: &str = "gamificationStats";
pub const ACHIEVEMENTS_KEY: &str = "achievements";

const ALL_KEYS: [&str; 4] = [
    LEARNING_STATS_KEY,
    USER_LEVEL_KEY,
    GAMIFICATION_STATS_KEY,
    ACHIEVEMENTS_KEY,
];

/// In-memory progress of one learner
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Progress {
    pub learning_stats: LearningStats,
    pub gamification: GamificationEngine,
}

#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn StateStore>,
    user_id: String,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn StateStore>, user_id: impl AsRef<str>) -> Self {
        Self {
            store,
            user_id: sanitize_user_id(user_id.as_ref()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}.{}", self.user_id, name)
    }

    /// Loads every snapshot. Missing or unreadable snapshots fall back to
    /// defaults; only store failures are errors.
    pub fn load(&self) -> StorageResult<Progress> {
        let learning_stats = self.read::<LearningStats>(LEARNING_STATS_KEY)?.unwrap_or_default();
        let level = self.read::<UserLevel>(USER_LEVEL_KEY)?;
        let stats = self.read::<GamificationStats>(GAMIFICATION_STATS_KEY)?;
        let achievements = self.read::<Vec<Achievement>>(ACHIEVEMENTS_KEY)?;

        debug!(user_id = %self.user_id, "progress loaded");
        Ok(Progress {
            learning_stats,
            gamification: GamificationEngine::restore(level, stats, achievements),
        })
    }

    /// Writes every snapshot. All four are serialized before the first
    /// write. The level goes after the achievements, so a failure part way
    /// can lose an unlock reward but never grant it twice.
    pub fn save(&self, progress: &Progress) -> StorageResult<()> {
        let gamification = &progress.gamification;
        let snapshots = [
            (LEARNING_STATS_KEY, serde_json::to_string(&progress.learning_stats)?),
            (GAMIFICATION_STATS_KEY, serde_json::to_string(gamification.stats())?),
            (ACHIEVEMENTS_KEY, serde_json::to_string(gamification.achievements())?),
            (USER_LEVEL_KEY, serde_json::to_string(gamification.level())?),
        ];

        for (written, (name, json)) in snapshots.iter().enumerate() {
            if let Err(e) = self.store.save(&self.key(name), json) {
                let written: Vec<&str> = snapshots[..written].iter().map(|(n, _)| *n).collect();
                warn!(
                    user_id = %self.user_id,
                    failed = *name,
                    written = ?written,
                    error = %e,
                    "progress save stopped part way"
                );
                return Err(e);
            }
        }
        debug!(user_id = %self.user_id, "progress saved");
        Ok(())
    }

    /// Deletes every snapshot of this user.
    pub fn clear(&self) -> StorageResult<()> {
        for name in ALL_KEYS {
            self.store.remove(&self.key(name))?;
        }
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> StorageResult<Option<T>> {
        let key = self.key(name);
        let Some(raw) = self.store.load(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding unreadable progress snapshot");
                Ok(None)
            }
        }
    }
}

fn sanitize_user_id(user_id: &str) -> String {
    let cleaned: String = user_id
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "local".to_string()
    } else {
        cleaned
    }
}
