use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user pointer through the 5-week program. Exactly one row per
/// user, created lazily on first access with week 1 / day 1 defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub current_week: i32,
    pub current_day: i32,
    pub week_start_date: DateTime<Utc>,
    pub total_activities_logged: i32,
    pub started_date: DateTime<Utc>,
    pub last_active_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One record of the append-only completion history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletedWeek {
    pub id: Uuid,
    pub progress_id: Uuid,
    pub week_number: i32,
    pub completed_date: DateTime<Utc>,
    pub session_read: bool,
    pub days_completed: i32,
    pub total_entries: i32,
    pub created_at: DateTime<Utc>,
}

/// Progress plus its history, the shape returned to clients.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    #[serde(flatten)]
    pub progress: UserProgress,
    pub completed_weeks: Vec<CompletedWeek>,
}

/// Aggregates over the current week's daily entries.
#[derive(Debug, Serialize)]
pub struct CurrentWeekStats {
    pub entries_count: i64,
    pub days_completed: i64,
}
