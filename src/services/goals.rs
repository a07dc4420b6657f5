use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use crate::store::{GraphError, PrefsStore};

const DEFAULT_DAILY_GOAL_TOPICS: u32 = 5;
const DEFAULT_DAILY_GOAL_QUIZZES: u32 = 3;

/// Date-keyed daily counters and consecutive-day streak state. All
/// comparisons are by calendar date, never wall-clock instant; callers supply
/// "today" as the date of their local day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub daily_goal_topics: u32,
    pub daily_goal_quizzes: u32,
    pub topics_reviewed_today: u32,
    pub quizzes_completed_today: u32,
    pub last_goal_reset_date: Option<NaiveDate>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            daily_goal_topics: DEFAULT_DAILY_GOAL_TOPICS,
            daily_goal_quizzes: DEFAULT_DAILY_GOAL_QUIZZES,
            topics_reviewed_today: 0,
            quizzes_completed_today: 0,
            last_goal_reset_date: None,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
        }
    }
}

impl ProgressState {
    /// Zeroes both daily counters the first time it runs on a new calendar
    /// day. Idempotent within a day; must run before any counter increment.
    pub fn check_and_reset(&mut self, today: NaiveDate) {
        if self.last_goal_reset_date != Some(today) {
            self.topics_reviewed_today = 0;
            self.quizzes_completed_today = 0;
            self.last_goal_reset_date = Some(today);
        }
    }

    /// Counts `today` toward the streak. A repeat call on an already-counted
    /// day is a no-op, so two activities on one day never double-increment.
    pub fn record_activity(&mut self, today: NaiveDate) {
        if self.last_study_date == Some(today) {
            return;
        }
        let continues = self
            .last_study_date
            .and_then(|last| last.succ_opt())
            .is_some_and(|next| next == today);
        self.current_streak = if continues { self.current_streak + 1 } else { 1 };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_study_date = Some(today);
    }

    // Order matters below: reset, then increment, then streak. Anything else
    // counts toward the wrong day or double-counts a streak day.

    pub fn increment_topics_reviewed(&mut self, today: NaiveDate) {
        self.check_and_reset(today);
        self.topics_reviewed_today += 1;
        self.record_activity(today);
    }

    pub fn increment_quizzes_completed(&mut self, today: NaiveDate) {
        self.check_and_reset(today);
        self.quizzes_completed_today += 1;
        self.record_activity(today);
    }

    pub fn set_goals(&mut self, daily_goal_topics: u32, daily_goal_quizzes: u32) {
        self.daily_goal_topics = daily_goal_topics;
        self.daily_goal_quizzes = daily_goal_quizzes;
    }
}

/// Persistence bridge: one flat key per field, keys exactly matching the wire
/// names, so the state survives process restart.
pub struct ProgressTracker {
    state: ProgressState,
}

impl ProgressTracker {
    pub fn load(prefs: &PrefsStore) -> Self {
        let defaults = ProgressState::default();
        let state = ProgressState {
            daily_goal_topics: prefs
                .get_u32("dailyGoalTopics")
                .unwrap_or(defaults.daily_goal_topics),
            daily_goal_quizzes: prefs
                .get_u32("dailyGoalQuizzes")
                .unwrap_or(defaults.daily_goal_quizzes),
            topics_reviewed_today: prefs.get_u32("topicsReviewedToday").unwrap_or(0),
            quizzes_completed_today: prefs.get_u32("quizzesCompletedToday").unwrap_or(0),
            last_goal_reset_date: read_date(prefs, "lastGoalResetDate"),
            current_streak: prefs.get_u32("currentStreak").unwrap_or(0),
            longest_streak: prefs.get_u32("longestStreak").unwrap_or(0),
            last_study_date: read_date(prefs, "lastStudyDate"),
        };
        Self { state }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub async fn apply<F>(
        &mut self,
        prefs: &PrefsStore,
        mutate: F,
    ) -> Result<ProgressState, GraphError>
    where
        F: FnOnce(&mut ProgressState),
    {
        mutate(&mut self.state);
        self.save(prefs).await?;
        Ok(self.state.clone())
    }

    async fn save(&self, prefs: &PrefsStore) -> Result<(), GraphError> {
        let s = &self.state;
        prefs
            .set_many([
                ("dailyGoalTopics".to_string(), json!(s.daily_goal_topics)),
                ("dailyGoalQuizzes".to_string(), json!(s.daily_goal_quizzes)),
                (
                    "topicsReviewedToday".to_string(),
                    json!(s.topics_reviewed_today),
                ),
                (
                    "quizzesCompletedToday".to_string(),
                    json!(s.quizzes_completed_today),
                ),
                (
                    "lastGoalResetDate".to_string(),
                    date_value(s.last_goal_reset_date),
                ),
                ("currentStreak".to_string(), json!(s.current_streak)),
                ("longestStreak".to_string(), json!(s.longest_streak)),
                ("lastStudyDate".to_string(), date_value(s.last_study_date)),
            ])
            .await
    }
}

fn read_date(prefs: &PrefsStore, key: &str) -> Option<NaiveDate> {
    prefs
        .get_str(key)
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn date_value(date: Option<NaiveDate>) -> serde_json::Value {
    match date {
        Some(d) => json!(d.format("%Y-%m-%d").to_string()),
        None => serde_json::Value::Null,
    }
}
