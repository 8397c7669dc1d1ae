//! Gamification
//!
//! Converts study statistics into XP, levels and achievement unlocks.
//! Nothing here is reactive: callers mutate stats and then call
//! [`GamificationEngine::check_achievements`] (the mutating helpers on the
//! engine already do so). Every notable change is returned as a
//! [`GamificationEvent`] so the caller decides how to surface it.

pub mod achievements;
pub mod level;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionSummary;
use crate::types::StudyMode;

pub use achievements::{catalog, merge_saved, Achievement, AchievementCategory, Rarity, StatKind};
pub use level::{level_title, xp_threshold, LevelUp, UserLevel};

/// XP granted per correct answer when a session completes
pub const XP_PER_CORRECT_ANSWER: u64 = 5;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GamificationStats {
    pub total_words_learned: u64,
    /// Minutes
    pub total_study_time: f64,
    pub stories_created: u64,
    pub quizzes_taken: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub perfect_quizzes: u64,
    /// Percentage of the active library marked learned
    pub vocabulary_mastery: f64,
}

/// Partial update of [`GamificationStats`]; `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsPatch {
    pub total_words_learned: Option<u64>,
    pub total_study_time: Option<f64>,
    pub stories_created: Option<u64>,
    pub quizzes_taken: Option<u64>,
    pub current_streak: Option<u32>,
    pub longest_streak: Option<u32>,
    pub perfect_quizzes: Option<u64>,
    pub vocabulary_mastery: Option<f64>,
}

impl GamificationStats {
    pub fn apply(&mut self, patch: &StatsPatch) {
        if let Some(v) = patch.total_words_learned {
            self.total_words_learned = v;
        }
        if let Some(v) = patch.total_study_time {
            self.total_study_time = v;
        }
        if let Some(v) = patch.stories_created {
            self.stories_created = v;
        }
        if let Some(v) = patch.quizzes_taken {
            self.quizzes_taken = v;
        }
        if let Some(v) = patch.current_streak {
            self.current_streak = v;
        }
        if let Some(v) = patch.longest_streak {
            self.longest_streak = v;
        }
        if let Some(v) = patch.perfect_quizzes {
            self.perfect_quizzes = v;
        }
        if let Some(v) = patch.vocabulary_mastery {
            self.vocabulary_mastery = v;
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GamificationEvent {
    XpAwarded { amount: u64, reason: String },
    LevelUp { level: u32, title: String },
    AchievementUnlocked { id: String, title: String, xp_reward: u64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamificationEngine {
    level: UserLevel,
    stats: GamificationStats,
    achievements: Vec<Achievement>,
}

impl Default for GamificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GamificationEngine {
    pub fn new() -> Self {
        Self {
            level: UserLevel::default(),
            stats: GamificationStats::default(),
            achievements: catalog(),
        }
    }

    /// Restores persisted state; saved achievements are merged onto the catalog.
    pub fn restore(
        level: Option<UserLevel>,
        stats: Option<GamificationStats>,
        saved_achievements: Option<Vec<Achievement>>,
    ) -> Self {
        Self {
            level: level.map(UserLevel::normalized).unwrap_or_default(),
            stats: stats.unwrap_or_default(),
            achievements: saved_achievements
                .map(|saved| merge_saved(&saved))
                .unwrap_or_else(catalog),
        }
    }

    pub fn level(&self) -> &UserLevel {
        &self.level
    }

    pub fn stats(&self) -> &GamificationStats {
        &self.stats
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn unlocked_achievements(&self) -> Vec<&Achievement> {
        self.achievements.iter().filter(|a| a.is_unlocked).collect()
    }

    pub fn locked_achievements(&self) -> Vec<&Achievement> {
        self.achievements.iter().filter(|a| !a.is_unlocked).collect()
    }

    pub fn progress_percentage(&self) -> f64 {
        self.level.progress_percentage()
    }

    pub fn add_xp(&mut self, amount: u64, reason: impl Into<String>) -> Vec<GamificationEvent> {
        let mut events = vec![GamificationEvent::XpAwarded {
            amount,
            reason: reason.into(),
        }];
        events.extend(
            self.level
                .add_xp(amount)
                .into_iter()
                .map(|up| GamificationEvent::LevelUp {
                    level: up.level,
                    title: up.title,
                }),
        );
        events
    }

    /// Re-reads every achievement's stat. Each first crossing unlocks the
    /// achievement and awards its XP exactly once.
    pub fn check_achievements(&mut self, now: DateTime<Utc>) -> Vec<GamificationEvent> {
        let mut unlocked = Vec::new();
        for achievement in &mut self.achievements {
            let Some(stat) = achievement.stat() else {
                continue;
            };
            if achievement.observe(stat.read(&self.stats), now) {
                unlocked.push((
                    achievement.id.clone(),
                    achievement.title.clone(),
                    achievement.xp_reward,
                ));
            }
        }

        let mut events = Vec::new();
        for (id, title, xp_reward) in unlocked {
            events.push(GamificationEvent::AchievementUnlocked {
                id,
                title: title.clone(),
                xp_reward,
            });
            events.extend(self.add_xp(xp_reward, format!("Achievement: {title}")));
        }
        events
    }

    pub fn update_stats(
        &mut self,
        patch: &StatsPatch,
        now: DateTime<Utc>,
    ) -> Vec<GamificationEvent> {
        self.stats.apply(patch);
        self.check_achievements(now)
    }

    pub fn record_story_created(&mut self, now: DateTime<Utc>) -> Vec<GamificationEvent> {
        self.stats.stories_created += 1;
        self.check_achievements(now)
    }

    /// Folds a completed session: study time, words learned, quiz counters,
    /// streak, session XP, then achievements.
    pub fn record_session(
        &mut self,
        summary: &SessionSummary,
        streak_days: u32,
        now: DateTime<Utc>,
    ) -> Vec<GamificationEvent> {
        self.stats.total_study_time += summary.duration_minutes;
        match summary.mode {
            StudyMode::Quiz => {
                self.stats.quizzes_taken += 1;
                if summary.is_perfect_quiz() {
                    self.stats.perfect_quizzes += 1;
                }
            }
            StudyMode::Flashcards | StudyMode::Review => {}
        }
        self.stats.current_streak = streak_days;
        self.stats.longest_streak = self.stats.longest_streak.max(streak_days);

        let mut events = Vec::new();
        let session_xp = summary.correct_answers as u64 * XP_PER_CORRECT_ANSWER;
        if session_xp > 0 {
            events.extend(self.add_xp(session_xp, "Session completed"));
        }
        events.extend(self.check_achievements(now));
        events
    }

    /// Counts one word newly marked as learned.
    pub fn record_word_learned(&mut self, now: DateTime<Utc>) -> Vec<GamificationEvent> {
        self.stats.total_words_learned += 1;
        self.check_achievements(now)
    }
}
