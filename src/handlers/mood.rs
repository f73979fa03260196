use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::mood_log::{CategoryCounts, MoodLog, MoodQuery, MoodStats, MoodTrendPoint};
use crate::AppState;

fn resolve_range(query: &MoodQuery) -> (NaiveDate, NaiveDate) {
    match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            let end = Utc::now().date_naive();
            let days = query.days.unwrap_or(30).clamp(1, 365);
            (end - Duration::days(days), end)
        }
    }
}

async fn fetch_logs(
    db: &sqlx::PgPool,
    user_id: uuid::Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<MoodLog>> {
    let logs = sqlx::query_as::<_, MoodLog>(
        r#"
        SELECT * FROM mood_logs
        WHERE user_id = $1 AND log_date BETWEEN $2 AND $3
        ORDER BY log_date ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    Ok(logs)
}

fn compute_stats(logs: &[MoodLog]) -> MoodStats {
    if logs.is_empty() {
        return MoodStats {
            total_days: 0,
            average_mood_before: 0.0,
            average_mood_after: 0.0,
            average_mood_change: 0.0,
            total_entries: 0,
            best_day: None,
            worst_day: None,
        };
    }

    let n = logs.len() as f64;
    let sum_before: f64 = logs.iter().map(|l| l.average_mood_before).sum();
    let sum_after: f64 = logs.iter().map(|l| l.average_mood_after).sum();
    let sum_change: f64 = logs.iter().map(|l| l.mood_change).sum();
    let total_entries: i64 = logs.iter().map(|l| i64::from(l.entry_count)).sum();

    let best_day = logs
        .iter()
        .max_by(|a, b| a.average_mood_after.total_cmp(&b.average_mood_after))
        .map(|l| l.log_date);
    let worst_day = logs
        .iter()
        .min_by(|a, b| a.average_mood_after.total_cmp(&b.average_mood_after))
        .map(|l| l.log_date);

    MoodStats {
        total_days: logs.len() as i64,
        average_mood_before: sum_before / n,
        average_mood_after: sum_after / n,
        average_mood_change: sum_change / n,
        total_entries,
        best_day,
        worst_day,
    }
}

/// Mood logs over a date range, with summary statistics.
pub async fn get_mood_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (start, end) = resolve_range(&query);
    let logs = fetch_logs(&state.db, auth_user.id, start, end).await?;
    let stats = compute_stats(&logs);

    Ok(Json(json!({
        "mood_logs": logs,
        "stats": stats,
        "date_range": { "start": start, "end": end },
    })))
}

pub async fn get_mood_log_by_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date must be in YYYY-MM-DD format".into()))?;

    let log = sqlx::query_as::<_, MoodLog>(
        "SELECT * FROM mood_logs WHERE user_id = $1 AND log_date = $2",
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("No mood log found for this date".into()))?;

    Ok(Json(json!({ "mood_log": log })))
}

/// Trend line plus per-category totals, for the analytics screen.
pub async fn get_mood_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (start, end) = resolve_range(&query);
    let logs = fetch_logs(&state.db, auth_user.id, start, end).await?;

    let trend_data: Vec<MoodTrendPoint> = logs
        .iter()
        .map(|l| MoodTrendPoint {
            date: l.log_date,
            mood_before: l.average_mood_before,
            mood_after: l.average_mood_after,
            mood_change: l.mood_change,
            entries: l.entry_count,
        })
        .collect();

    let mut category_totals = CategoryCounts::default();
    for log in &logs {
        category_totals.routine += log.categories.routine;
        category_totals.necessary += log.categories.necessary;
        category_totals.pleasurable += log.categories.pleasurable;
    }

    Ok(Json(json!({
        "trend_data": trend_data,
        "category_totals": category_totals,
        "total_days": logs.len(),
        "date_range": { "start": start, "end": end },
    })))
}
