pub mod activity;
pub mod daily_entry;
pub mod diary_entry;
pub mod mood_log;
pub mod progress;
pub mod session;
pub mod user;

use serde::Serialize;

/// Pagination block attached to list responses.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}
