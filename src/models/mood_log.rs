use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Derived per-day aggregate of a user's diary entries. One row per
/// (user, date); written only by the recompute in `services::mood`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub average_mood_before: f64,
    pub average_mood_after: f64,
    pub mood_change: f64,
    pub entry_count: i32,
    pub entry_ids: Vec<Uuid>,
    #[sqlx(flatten)]
    pub categories: CategoryCounts,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counts of contributing entries per activity category. Entries with
/// no linked catalog activity count toward no category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CategoryCounts {
    #[sqlx(rename = "routine_count")]
    pub routine: i32,
    #[sqlx(rename = "necessary_count")]
    pub necessary: i32,
    #[sqlx(rename = "pleasurable_count")]
    pub pleasurable: i32,
}

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days: Option<i64>,
}

/// Summary statistics over a range of mood logs.
#[derive(Debug, Serialize)]
pub struct MoodStats {
    pub total_days: i64,
    pub average_mood_before: f64,
    pub average_mood_after: f64,
    pub average_mood_change: f64,
    pub total_entries: i64,
    pub best_day: Option<NaiveDate>,
    pub worst_day: Option<NaiveDate>,
}

/// One point of the mood trend line.
#[derive(Debug, Serialize)]
pub struct MoodTrendPoint {
    pub date: NaiveDate,
    pub mood_before: f64,
    pub mood_after: f64,
    pub mood_change: f64,
    pub entries: i32,
}
