//! Achievement catalog
//!
//! The catalog is fixed; only `current_progress`, `is_unlocked` and
//! `unlocked_at` change at runtime. Each achievement reads exactly one stat,
//! chosen by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GamificationStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Learning,
    Vocabulary,
    Stories,
    Consistency,
    Social,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// The stat an achievement measures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatKind {
    WordsLearned,
    StoriesCreated,
    CurrentStreak,
    QuizzesTaken,
    PerfectQuizzes,
}

impl StatKind {
    pub fn for_achievement(id: &str) -> Option<Self> {
        match id {
            "first_word" | "word_collector_10" | "vocabulary_master_100" | "word_sage_500" => {
                Some(Self::WordsLearned)
            }
            "storyteller" | "author" => Some(Self::StoriesCreated),
            "daily_learner" | "week_warrior" | "month_master" => Some(Self::CurrentStreak),
            "quiz_taker" | "quiz_master" => Some(Self::QuizzesTaken),
            "perfect_score" => Some(Self::PerfectQuizzes),
            _ => None,
        }
    }

    pub fn read(&self, stats: &GamificationStats) -> u64 {
        match self {
            Self::WordsLearned => stats.total_words_learned,
            Self::StoriesCreated => stats.stories_created,
            Self::CurrentStreak => stats.current_streak as u64,
            Self::QuizzesTaken => stats.quizzes_taken,
            Self::PerfectQuizzes => stats.perfect_quizzes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub requirement: u64,
    pub current_progress: u64,
    pub is_unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    pub rarity: Rarity,
    pub xp_reward: u64,
}

impl Achievement {
    pub fn stat(&self) -> Option<StatKind> {
        StatKind::for_achievement(&self.id)
    }

    /// Updates progress; returns `true` only on the locked -> unlocked transition.
    pub fn observe(&mut self, progress: u64, now: DateTime<Utc>) -> bool {
        self.current_progress = progress;
        if self.is_unlocked || progress < self.requirement {
            return false;
        }
        self.is_unlocked = true;
        self.unlocked_at = Some(now);
        true
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.is_unlocked || self.requirement == 0 {
            return 100.0;
        }
        (self.current_progress as f64 / self.requirement as f64 * 100.0).min(100.0)
    }
}

/// Static definition of a catalog entry; progress fields start empty.
struct Definition {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    category: AchievementCategory,
    requirement: u64,
    rarity: Rarity,
    xp_reward: u64,
}

impl From<&Definition> for Achievement {
    fn from(def: &Definition) -> Self {
        Self {
            id: def.id.to_string(),
            title: def.title.to_string(),
            description: def.description.to_string(),
            icon: def.icon.to_string(),
            category: def.category,
            requirement: def.requirement,
            current_progress: 0,
            is_unlocked: false,
            unlocked_at: None,
            rarity: def.rarity,
            xp_reward: def.xp_reward,
        }
    }
}

const CATALOG: [Definition; 12] = [
    Definition {
        id: "first_word",
        title: "First Steps",
        description: "Learn your first vocabulary word",
        icon: "🌱",
        category: AchievementCategory::Learning,
        requirement: 1,
        rarity: Rarity::Common,
        xp_reward: 10,
    },
    Definition {
        id: "word_collector_10",
        title: "Word Collector",
        description: "Learn 10 vocabulary words",
        icon: "📚",
        category: AchievementCategory::Learning,
        requirement: 10,
        rarity: Rarity::Common,
        xp_reward: 50,
    },
    Definition {
        id: "vocabulary_master_100",
        title: "Vocabulary Master",
        description: "Learn 100 vocabulary words",
        icon: "🎓",
        category: AchievementCategory::Learning,
        requirement: 100,
        rarity: Rarity::Rare,
        xp_reward: 200,
    },
    Definition {
        id: "word_sage_500",
        title: "Word Sage",
        description: "Learn 500 vocabulary words",
        icon: "🧙",
        category: AchievementCategory::Learning,
        requirement: 500,
        rarity: Rarity::Epic,
        xp_reward: 500,
    },
    Definition {
        id: "storyteller",
        title: "Storyteller",
        description: "Create your first story",
        icon: "✍️",
        category: AchievementCategory::Stories,
        requirement: 1,
        rarity: Rarity::Common,
        xp_reward: 25,
    },
    Definition {
        id: "author",
        title: "Aspiring Author",
        description: "Create 5 stories",
        icon: "📖",
        category: AchievementCategory::Stories,
        requirement: 5,
        rarity: Rarity::Rare,
        xp_reward: 100,
    },
    Definition {
        id: "daily_learner",
        title: "Daily Learner",
        description: "Study for 3 days in a row",
        icon: "🔥",
        category: AchievementCategory::Consistency,
        requirement: 3,
        rarity: Rarity::Common,
        xp_reward: 30,
    },
    Definition {
        id: "week_warrior",
        title: "Week Warrior",
        description: "Study for 7 days in a row",
        icon: "⚡",
        category: AchievementCategory::Consistency,
        requirement: 7,
        rarity: Rarity::Rare,
        xp_reward: 100,
    },
    Definition {
        id: "month_master",
        title: "Month Master",
        description: "Study for 30 days in a row",
        icon: "👑",
        category: AchievementCategory::Consistency,
        requirement: 30,
        rarity: Rarity::Legendary,
        xp_reward: 1000,
    },
    Definition {
        id: "quiz_taker",
        title: "Quiz Taker",
        description: "Complete your first quiz",
        icon: "🧠",
        category: AchievementCategory::Vocabulary,
        requirement: 1,
        rarity: Rarity::Common,
        xp_reward: 15,
    },
    Definition {
        id: "perfect_score",
        title: "Perfect Score",
        description: "Get 100% on a quiz",
        icon: "💯",
        category: AchievementCategory::Vocabulary,
        requirement: 1,
        rarity: Rarity::Rare,
        xp_reward: 75,
    },
    Definition {
        id: "quiz_master",
        title: "Quiz Master",
        description: "Complete 50 quizzes",
        icon: "🏆",
        category: AchievementCategory::Vocabulary,
        requirement: 50,
        rarity: Rarity::Epic,
        xp_reward: 300,
    },
];

pub fn catalog() -> Vec<Achievement> {
    CATALOG.iter().map(Achievement::from).collect()
}

/// Overlays saved progress onto the catalog by id. Saved entries with
/// unknown ids are dropped; definitions always come from the catalog.
pub fn merge_saved(saved: &[Achievement]) -> Vec<Achievement> {
    catalog()
        .into_iter()
        .map(|mut achievement| {
            if let Some(s) = saved.iter().find(|s| s.id == achievement.id) {
                achievement.current_progress = s.current_progress;
                achievement.is_unlocked = s.is_unlocked;
                achievement.unlocked_at = s.unlocked_at;
            }
            achievement
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique_and_mapped() {
        let list = catalog();
        assert_eq!(list.len(), 12);
        let mut ids: Vec<_> = list.iter().map(|a| a.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 12);
        assert!(list.iter().all(|a| a.stat().is_some()));
    }

    #[test]
    fn test_catalog_entries_start_locked() {
        let list = catalog();
        assert!(list
            .iter()
            .all(|a| !a.is_unlocked && a.current_progress == 0 && a.unlocked_at.is_none()));
        let month = list.iter().find(|a| a.id == "month_master").unwrap();
        assert_eq!(month.category, AchievementCategory::Consistency);
        assert_eq!(month.rarity, Rarity::Legendary);
        assert_eq!((month.requirement, month.xp_reward), (30, 1000));
        let perfect = list.iter().find(|a| a.id == "perfect_score").unwrap();
        assert_eq!(perfect.category, AchievementCategory::Vocabulary);
        assert_eq!((perfect.requirement, perfect.xp_reward), (1, 75));
    }

    #[test]
    fn test_observe_unlocks_once() {
        let mut a = catalog().remove(0);
        let now = Utc::now();
        assert!(a.observe(1, now));
        assert!(!a.observe(5, Utc::now()));
        assert_eq!(a.unlocked_at, Some(now));
        assert_eq!(a.current_progress, 5);
    }

    #[test]
    fn test_merge_saved_keeps_catalog_definitions() {
        let mut saved = catalog();
        saved[1].is_unlocked = true;
        saved[1].current_progress = 12;
        saved[1].xp_reward = 9999;
        let merged = merge_saved(&saved[..2]);
        assert_eq!(merged.len(), 12);
        assert!(merged[1].is_unlocked);
        assert_eq!(merged[1].current_progress, 12);
        assert_eq!(merged[1].xp_reward, 50);
        assert!(!merged[2].is_unlocked);
    }

    #[test]
    fn test_progress_percentage_caps() {
        let mut a = catalog().remove(1);
        a.current_progress = 5;
        assert!((a.progress_percentage() - 50.0).abs() < 1e-9);
        a.current_progress = 50;
        assert_eq!(a.progress_percentage(), 100.0);
    }
}
