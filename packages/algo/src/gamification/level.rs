//! Levels and experience points
//!
//! Level `n` requires `floor(100 * 1.2^(n-1))` XP to reach level `n + 1`.
//! Overflow carries into the following levels.

use serde::{Deserialize, Serialize};

const BASE_XP: f64 = 100.0;
const GROWTH: f64 = 1.2;

/// XP needed to leave `level`
pub fn xp_threshold(level: u32) -> u64 {
    let exponent = level.max(1) - 1;
    (BASE_XP * GROWTH.powi(exponent as i32)).floor() as u64
}

pub fn level_title(level: u32) -> &'static str {
    match level {
        0..=4 => "Vocabulary Novice",
        5..=9 => "Word Explorer",
        10..=19 => "Language Learner",
        20..=34 => "Vocabulary Scholar",
        35..=49 => "Word Master",
        50..=74 => "Language Expert",
        75..=99 => "Vocabulary Sage",
        _ => "Legendary Wordsmith",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLevel {
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u64,
    /// Threshold of the current level
    #[serde(rename = "xpToNextLevel")]
    pub xp_to_next_level: u64,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub title: String,
}

impl Default for UserLevel {
    fn default() -> Self {
        Self {
            level: 1,
            current_xp: 0,
            xp_to_next_level: xp_threshold(1),
            total_xp: 0,
            title: level_title(1).to_string(),
        }
    }
}

/// One level gained
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub level: u32,
    pub title: String,
}

impl UserLevel {
    /// Adds XP and returns one `LevelUp` per level crossed.
    pub fn add_xp(&mut self, amount: u64) -> Vec<LevelUp> {
        self.total_xp = self.total_xp.saturating_add(amount);
        self.current_xp = self.current_xp.saturating_add(amount);

        let mut level_ups = Vec::new();
        while self.current_xp >= self.xp_to_next_level {
            self.current_xp -= self.xp_to_next_level;
            self.level += 1;
            self.xp_to_next_level = xp_threshold(self.level);
            level_ups.push(LevelUp {
                level: self.level,
                title: level_title(self.level).to_string(),
            });
        }
        self.title = level_title(self.level).to_string();
        level_ups
    }

    /// Progress through the current level, in percent
    pub fn progress_percentage(&self) -> f64 {
        if self.xp_to_next_level == 0 {
            return 0.0;
        }
        self.current_xp as f64 / self.xp_to_next_level as f64 * 100.0
    }

    /// Repairs snapshots written with an inconsistent threshold.
    pub fn normalized(mut self) -> Self {
        self.level = self.level.max(1);
        self.xp_to_next_level = xp_threshold(self.level);
        self.title = level_title(self.level).to_string();
        self.add_xp(0);
        self
    }
}
