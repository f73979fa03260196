use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::daily_entry::{CreateDailyEntryRequest, DailyEntry, UpdateDailyEntryRequest};
use crate::models::progress::ProgressView;
use crate::services::progress;
use crate::AppState;

fn check_len(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    if let Some(value) = value {
        if value.len() > max {
            return Err(AppError::Validation(format!(
                "{} cannot exceed {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

fn check_required(field: &str, value: Option<&str>) -> AppResult<()> {
    if let Some(value) = value {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
    }
    Ok(())
}

fn validate_fields(
    time: Option<&str>,
    activity: Option<&str>,
    location: Option<&str>,
    with_whom: Option<&str>,
    mood_before: Option<&str>,
    mood_after: Option<&str>,
    notes: Option<&str>,
) -> AppResult<()> {
    check_required("Time", time)?;
    check_required("Activity", activity)?;
    check_required("Mood before", mood_before)?;
    check_required("Mood after", mood_after)?;
    check_len("Activity", activity, 300)?;
    check_len("Location", location, 100)?;
    check_len("Company", with_whom, 100)?;
    check_len("Mood before", mood_before, 100)?;
    check_len("Mood after", mood_after, 100)?;
    check_len("Notes", notes, 500)?;
    Ok(())
}

fn validate_week_number(week_number: i32) -> AppResult<()> {
    if !(1..=progress::FINAL_WEEK).contains(&week_number) {
        return Err(AppError::Validation(
            "Week number must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

/// Log a baseline-diary entry. The entry is stamped with the user's
/// current week and a day number derived from the week start date, and
/// the progress pointer advances to that day.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateDailyEntryRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    validate_fields(
        Some(&body.time),
        Some(&body.activity),
        body.location.as_deref(),
        body.with_whom.as_deref(),
        Some(&body.mood_before),
        Some(&body.mood_after),
        body.notes.as_deref(),
    )?;

    let user_progress = progress::get_or_create(&state.db, auth_user.id).await?;

    let today = Utc::now().date_naive();
    let day_number = progress::day_number_for(user_progress.week_start_date.date_naive(), today);

    let entry = sqlx::query_as::<_, DailyEntry>(
        r#"
        INSERT INTO daily_entries (
            id, user_id, week_number, day_number, entry_date,
            time_of_day, time, activity, location, with_whom,
            mood_before, mood_after, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(user_progress.current_week)
    .bind(day_number)
    .bind(today)
    .bind(body.time_of_day)
    .bind(body.time.trim())
    .bind(body.activity.trim())
    .bind(&body.location)
    .bind(&body.with_whom)
    .bind(body.mood_before.trim())
    .bind(body.mood_after.trim())
    .bind(&body.notes)
    .fetch_one(&state.db)
    .await?;

    progress::record_activity_logged(&state.db, user_progress.id, day_number).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Entry created successfully",
            "entry": entry,
        })),
    ))
}

/// All entries of a week, also grouped per day for the diary screen.
pub async fn get_week_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(week_number): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    validate_week_number(week_number)?;

    let entries = sqlx::query_as::<_, DailyEntry>(
        r#"
        SELECT * FROM daily_entries
        WHERE user_id = $1 AND week_number = $2
        ORDER BY entry_date ASC, time ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(week_number)
    .fetch_all(&state.db)
    .await?;

    let mut grouped_by_day: BTreeMap<i32, Vec<&DailyEntry>> = BTreeMap::new();
    for entry in &entries {
        grouped_by_day.entry(entry.day_number).or_default().push(entry);
    }

    Ok(Json(json!({
        "total_entries": entries.len(),
        "days_with_entries": grouped_by_day.len(),
        "grouped_by_day": grouped_by_day,
        "entries": entries,
    })))
}

pub async fn get_day_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((week_number, day_number)): Path<(i32, i32)>,
) -> AppResult<Json<serde_json::Value>> {
    validate_week_number(week_number)?;
    if !(1..=progress::DAYS_PER_WEEK).contains(&day_number) {
        return Err(AppError::Validation(
            "Day number must be between 1 and 7".into(),
        ));
    }

    let entries = sqlx::query_as::<_, DailyEntry>(
        r#"
        SELECT * FROM daily_entries
        WHERE user_id = $1 AND week_number = $2 AND day_number = $3
        ORDER BY time ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(week_number)
    .bind(day_number)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "count": entries.len(),
        "entries": entries,
    })))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateDailyEntryRequest>,
) -> AppResult<Json<serde_json::Value>> {
    validate_fields(
        body.time.as_deref(),
        body.activity.as_deref(),
        body.location.as_deref(),
        body.with_whom.as_deref(),
        body.mood_before.as_deref(),
        body.mood_after.as_deref(),
        body.notes.as_deref(),
    )?;

    let entry = sqlx::query_as::<_, DailyEntry>(
        r#"
        UPDATE daily_entries SET
            time_of_day = COALESCE($3, time_of_day),
            time = COALESCE($4, time),
            activity = COALESCE($5, activity),
            location = COALESCE($6, location),
            with_whom = COALESCE($7, with_whom),
            mood_before = COALESCE($8, mood_before),
            mood_after = COALESCE($9, mood_after),
            notes = COALESCE($10, notes),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(body.time_of_day)
    .bind(body.time.as_deref().map(str::trim))
    .bind(body.activity.as_deref().map(str::trim))
    .bind(&body.location)
    .bind(&body.with_whom)
    .bind(body.mood_before.as_deref().map(str::trim))
    .bind(body.mood_after.as_deref().map(str::trim))
    .bind(&body.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    Ok(Json(json!({
        "message": "Entry updated successfully",
        "entry": entry,
    })))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = sqlx::query_scalar::<_, Uuid>(
        "DELETE FROM daily_entries WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?;

    if deleted.is_none() {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    sqlx::query(
        r#"
        UPDATE user_progress SET
            total_activities_logged = GREATEST(total_activities_logged - 1, 0),
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(auth_user.id)
    .execute(&state.db)
    .await?;

    Ok(Json(json!({ "message": "Entry deleted successfully" })))
}

/// Close the current week: count its entries, append the completion
/// record and advance the pointer (terminal at week 5).
pub async fn complete_week(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let mut user_progress = progress::get_or_create(&state.db, auth_user.id).await?;

    let entries_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM daily_entries WHERE user_id = $1 AND week_number = $2",
    )
    .bind(auth_user.id)
    .bind(user_progress.current_week)
    .fetch_one(&state.db)
    .await?;

    let completion = progress::complete_week(&mut user_progress, Utc::now(), entries_count);
    progress::persist_completion(&state.db, &user_progress, &completion).await?;

    let completed_weeks = progress::completed_weeks(&state.db, user_progress.id).await?;

    Ok(Json(json!({
        "message": "Week completed successfully",
        "entries_completed": entries_count,
        "user_progress": ProgressView {
            progress: user_progress,
            completed_weeks,
        },
    })))
}
