//! Learning statistics
//!
//! Process-wide study totals, folded once per completed session.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionSummary;

/// How a session's accuracy is folded into `average_accuracy`.
///
/// `Legacy` reproduces the historical `(old + session) / 2` blend, which
/// weights recent sessions exponentially. `Weighted` is the running mean over
/// every completed session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyBlend {
    #[default]
    Legacy,
    Weighted,
}

impl std::str::FromStr for AccuracyBlend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "weighted" => Ok(Self::Weighted),
            other => Err(format!("unknown accuracy blend: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub total_words_studied: u64,
    /// Minutes
    #[serde(rename = "totalTimeSpent")]
    pub total_time_spent: f64,
    /// Percentage, 0..=100
    pub average_accuracy: f64,
    #[serde(default)]
    pub sessions_completed: u64,
    pub streak_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_study_date: Option<DateTime<Utc>>,
    /// Words answered per weekday of the current week, Monday first
    pub weekly_progress: [u32; 7],
}

impl Default for LearningStats {
    fn default() -> Self {
        Self {
            total_words_studied: 0,
            total_time_spent: 0.0,
            average_accuracy: 0.0,
            sessions_completed: 0,
            streak_days: 0,
            last_study_date: None,
            weekly_progress: [0; 7],
        }
    }
}

impl LearningStats {
    pub fn record_session(
        &mut self,
        summary: &SessionSummary,
        blend: AccuracyBlend,
        now: DateTime<Utc>,
    ) {
        let today = now.date_naive();
        let previous = self.last_study_date.map(|d| d.date_naive());

        if previous.map_or(true, |p| !same_week(p, today)) {
            self.weekly_progress = [0; 7];
        }
        let weekday = today.weekday().num_days_from_monday() as usize;
        self.weekly_progress[weekday] =
            self.weekly_progress[weekday].saturating_add(summary.total_answered);

        self.streak_days = next_streak(self.streak_days, previous, today);
        self.total_words_studied += summary.total_answered as u64;
        self.total_time_spent += summary.duration_minutes;
        self.average_accuracy = blend_accuracy(
            self.average_accuracy,
            self.sessions_completed,
            summary.accuracy,
            blend,
        );
        self.sessions_completed += 1;
        self.last_study_date = Some(now);
    }
}

pub fn blend_accuracy(
    previous: f64,
    sessions: u64,
    session_accuracy: f64,
    blend: AccuracyBlend,
) -> f64 {
    match blend {
        AccuracyBlend::Legacy => (previous + session_accuracy) / 2.0,
        AccuracyBlend::Weighted => {
            let n = sessions as f64;
            (previous * n + session_accuracy) / (n + 1.0)
        }
    }
}

/// Consecutive study days after studying on `today`.
pub fn next_streak(current: u32, last: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last {
        Some(last) if last == today => current.max(1),
        Some(last) if last.succ_opt() == Some(today) => current.saturating_add(1),
        _ => 1,
    }
}

fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    a.iso_week() == b.iso_week()
}
