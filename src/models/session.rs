use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Weekly educational session content. Static, seeded by migration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub week_number: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub introduction: String,
    pub sections: serde_json::Value,
    pub task_description: String,
    pub task_instructions: Vec<String>,
    pub example_content: Option<String>,
    pub duration: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
