use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::activity::{ActivityCategory, ActivityDifficulty};

/// Freeform diary entry on the numeric 1-10 mood scale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity: String,
    pub activity_id: Option<Uuid>,
    pub mood_before: Option<i32>,
    pub mood_after: i32,
    pub notes: Option<String>,
    pub time_of_day: TimeOfDay,
    pub logged_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "time_of_day")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Bucket an hour-of-day the same way the diary form does:
    /// 05-11 Morning, 12-16 Afternoon, 17-20 Evening, everything else Night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }
}

/// Entry joined with its catalog activity (when linked) plus the
/// derived mood change, as returned by read endpoints.
#[derive(Debug, Serialize, FromRow)]
pub struct DiaryEntryDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub entry: DiaryEntry,
    pub mood_change: Option<i32>,
    pub activity_name: Option<String>,
    pub activity_category: Option<ActivityCategory>,
    pub activity_difficulty: Option<ActivityDifficulty>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDiaryEntryRequest {
    pub activity: String,
    pub activity_id: Option<Uuid>,
    pub mood_before: Option<i32>,
    pub mood_after: i32,
    pub notes: Option<String>,
    pub time_of_day: Option<TimeOfDay>,
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDiaryEntryRequest {
    pub activity: Option<String>,
    pub activity_id: Option<Uuid>,
    pub mood_before: Option<i32>,
    pub mood_after: Option<i32>,
    pub notes: Option<String>,
    pub time_of_day: Option<TimeOfDay>,
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DiaryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub time_of_day: Option<TimeOfDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_buckets_match_the_diary_form() {
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
    }
}
