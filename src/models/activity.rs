use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog activity. Rows without a `user_id` belong to the shared,
/// seeded catalog; rows with one are user-created custom activities.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub category: ActivityCategory,
    pub difficulty: ActivityDifficulty,
    pub description: Option<String>,
    pub estimated_duration: Option<i32>,
    pub tags: Vec<String>,
    pub is_custom: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "activity_category")]
pub enum ActivityCategory {
    Routine,
    Necessary,
    Pleasurable,
}

impl ActivityCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Routine" => Some(Self::Routine),
            "Necessary" => Some(Self::Necessary),
            "Pleasurable" => Some(Self::Pleasurable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "activity_difficulty")]
pub enum ActivityDifficulty {
    Easiest,
    Moderate,
    Difficult,
}

impl ActivityDifficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Easiest" => Some(Self::Easiest),
            "Moderate" => Some(Self::Moderate),
            "Difficult" => Some(Self::Difficult),
            _ => None,
        }
    }
}

impl Default for ActivityDifficulty {
    fn default() -> Self {
        Self::Moderate
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub name: String,
    pub category: ActivityCategory,
    pub difficulty: Option<ActivityDifficulty>,
    pub description: Option<String>,
    pub estimated_duration: Option<i32>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivityRequest {
    pub name: Option<String>,
    pub category: Option<ActivityCategory>,
    pub difficulty: Option<ActivityDifficulty>,
    pub description: Option<String>,
    pub estimated_duration: Option<i32>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub difficulty: String,
}
