use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::progress::{CurrentWeekStats, ProgressView};
use crate::models::session::Session;
use crate::services::progress;
use crate::AppState;

fn validate_week_number(week_number: i32) -> AppResult<()> {
    if !(1..=progress::FINAL_WEEK).contains(&week_number) {
        return Err(AppError::Validation(
            "Week number must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

async fn current_week_stats(
    db: &sqlx::PgPool,
    user_id: Uuid,
    week_number: i32,
) -> AppResult<CurrentWeekStats> {
    let entries_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM daily_entries WHERE user_id = $1 AND week_number = $2",
    )
    .bind(user_id)
    .bind(week_number)
    .fetch_one(db)
    .await?;

    let days_completed = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT day_number) FROM daily_entries WHERE user_id = $1 AND week_number = $2",
    )
    .bind(user_id)
    .bind(week_number)
    .fetch_one(db)
    .await?;

    Ok(CurrentWeekStats {
        entries_count,
        days_completed,
    })
}

/// The user's position in the program, with this week's diary stats.
pub async fn get_user_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let user_progress = progress::get_or_create(&state.db, auth_user.id).await?;
    let completed_weeks = progress::completed_weeks(&state.db, user_progress.id).await?;
    let stats = current_week_stats(&state.db, auth_user.id, user_progress.current_week).await?;

    Ok(Json(json!({
        "user_progress": ProgressView {
            progress: user_progress,
            completed_weeks,
        },
        "current_week_stats": stats,
    })))
}

/// Weekly session content, gated behind completion of the prior week.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(week_number): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    validate_week_number(week_number)?;

    let user_progress = progress::get_or_create(&state.db, auth_user.id).await?;
    let history = progress::completed_weeks(&state.db, user_progress.id).await?;

    if !progress::is_week_unlocked(&history, week_number) {
        return Err(AppError::Forbidden(
            "Complete the previous week to unlock this session".into(),
        ));
    }

    let session = sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions WHERE week_number = $1 AND is_active = TRUE",
    )
    .bind(week_number)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("No session found for this week".into()))?;

    Ok(Json(json!({
        "session": session,
        "user_progress": {
            "current_week": user_progress.current_week,
            "current_day": user_progress.current_day,
            "is_current_week": user_progress.current_week == week_number,
        },
    })))
}

/// Mark a completed week's session as read. A week that has not been
/// completed yet has no history record to flag, which is surfaced as
/// NotFound rather than silently ignored.
pub async fn mark_session_read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(week_number): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    validate_week_number(week_number)?;

    let user_progress = progress::get_or_create(&state.db, auth_user.id).await?;

    let updated = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE completed_weeks SET session_read = TRUE
        WHERE progress_id = $1 AND week_number = $2
        RETURNING id
        "#,
    )
    .bind(user_progress.id)
    .bind(week_number)
    .fetch_optional(&state.db)
    .await?;

    if updated.is_none() {
        return Err(AppError::NotFound(format!(
            "Week {} has not been completed yet",
            week_number
        )));
    }

    let completed_weeks = progress::completed_weeks(&state.db, user_progress.id).await?;

    Ok(Json(json!({
        "message": "Session marked as read",
        "user_progress": ProgressView {
            progress: user_progress,
            completed_weeks,
        },
    })))
}
