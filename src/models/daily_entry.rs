use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::diary_entry::TimeOfDay;

/// Structured baseline-diary entry. Mood values are free-text labels
/// ("Fed up", "Better"), not the numeric scale used by diary entries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_number: i32,
    pub day_number: i32,
    pub entry_date: NaiveDate,
    pub time_of_day: TimeOfDay,
    pub time: String,
    pub activity: String,
    pub location: Option<String>,
    pub with_whom: Option<String>,
    pub mood_before: String,
    pub mood_after: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDailyEntryRequest {
    pub time_of_day: TimeOfDay,
    pub time: String,
    pub activity: String,
    pub location: Option<String>,
    pub with_whom: Option<String>,
    pub mood_before: String,
    pub mood_after: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDailyEntryRequest {
    pub time_of_day: Option<TimeOfDay>,
    pub time: Option<String>,
    pub activity: Option<String>,
    pub location: Option<String>,
    pub with_whom: Option<String>,
    pub mood_before: Option<String>,
    pub mood_after: Option<String>,
    pub notes: Option<String>,
}
