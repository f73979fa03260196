use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Timelike, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::diary_entry::{
    CreateDiaryEntryRequest, DiaryEntry, DiaryEntryDetail, DiaryQuery, TimeOfDay,
    UpdateDiaryEntryRequest,
};
use crate::models::Pagination;
use crate::services::mood;
use crate::AppState;

const DETAIL_COLUMNS: &str = r#"
    d.*,
    d.mood_after - d.mood_before AS mood_change,
    a.name AS activity_name,
    a.category AS activity_category,
    a.difficulty AS activity_difficulty
"#;

fn validate_entry_fields(
    activity: Option<&str>,
    mood_before: Option<i32>,
    mood_after: Option<i32>,
    notes: Option<&str>,
) -> AppResult<()> {
    if let Some(activity) = activity {
        if activity.trim().is_empty() {
            return Err(AppError::Validation("Activity description is required".into()));
        }
        if activity.len() > 300 {
            return Err(AppError::Validation(
                "Activity description cannot exceed 300 characters".into(),
            ));
        }
    }
    for mood in [mood_before, mood_after].into_iter().flatten() {
        if !(1..=10).contains(&mood) {
            return Err(AppError::Validation(
                "Mood rating must be between 1 and 10".into(),
            ));
        }
    }
    if let Some(notes) = notes {
        if notes.len() > 1000 {
            return Err(AppError::Validation(
                "Notes cannot exceed 1000 characters".into(),
            ));
        }
    }
    Ok(())
}

/// A linked activity must exist and be visible to the caller: either a
/// shared catalog row or one of their own active custom activities.
async fn verify_activity_ref(db: &sqlx::PgPool, user_id: Uuid, activity_id: Uuid) -> AppResult<()> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM activities
        WHERE id = $1 AND (user_id IS NULL OR (user_id = $2 AND is_active = TRUE))
        "#,
    )
    .bind(activity_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::Validation("Unknown activity".into()))?;

    Ok(())
}

async fn fetch_detail(db: &sqlx::PgPool, user_id: Uuid, id: Uuid) -> AppResult<DiaryEntryDetail> {
    let entry = sqlx::query_as::<_, DiaryEntryDetail>(&format!(
        r#"
        SELECT {DETAIL_COLUMNS}
        FROM diary_entries d
        LEFT JOIN activities a ON a.id = d.activity_id
        WHERE d.id = $1 AND d.user_id = $2
        "#,
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("Diary entry not found".into()))?;

    Ok(entry)
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DiaryQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let start = query.start_date.map(|d| mood::day_bounds(d).0);
    let end = query.end_date.map(|d| mood::day_bounds(d).1);

    let entries = sqlx::query_as::<_, DiaryEntryDetail>(&format!(
        r#"
        SELECT {DETAIL_COLUMNS}
        FROM diary_entries d
        LEFT JOIN activities a ON a.id = d.activity_id
        WHERE d.user_id = $1
          AND ($2::timestamptz IS NULL OR d.logged_at >= $2)
          AND ($3::timestamptz IS NULL OR d.logged_at <= $3)
          AND ($4::time_of_day IS NULL OR d.time_of_day = $4)
        ORDER BY d.logged_at DESC
        LIMIT $5 OFFSET $6
        "#,
    ))
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .bind(query.time_of_day)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM diary_entries d
        WHERE d.user_id = $1
          AND ($2::timestamptz IS NULL OR d.logged_at >= $2)
          AND ($3::timestamptz IS NULL OR d.logged_at <= $3)
          AND ($4::time_of_day IS NULL OR d.time_of_day = $4)
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .bind(query.time_of_day)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({
        "entries": entries,
        "pagination": Pagination::new(page, limit, total),
    })))
}

pub async fn get_entries_by_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date must be in YYYY-MM-DD format".into()))?;
    let (start, end) = mood::day_bounds(date);

    let entries = sqlx::query_as::<_, DiaryEntryDetail>(&format!(
        r#"
        SELECT {DETAIL_COLUMNS}
        FROM diary_entries d
        LEFT JOIN activities a ON a.id = d.activity_id
        WHERE d.user_id = $1 AND d.logged_at BETWEEN $2 AND $3
        ORDER BY d.logged_at ASC
        "#,
    ))
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "date": date,
        "count": entries.len(),
        "entries": entries,
    })))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DiaryEntryDetail>> {
    let entry = fetch_detail(&state.db, auth_user.id, entry_id).await?;
    Ok(Json(entry))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateDiaryEntryRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    validate_entry_fields(
        Some(&body.activity),
        body.mood_before,
        Some(body.mood_after),
        body.notes.as_deref(),
    )?;

    if let Some(activity_id) = body.activity_id {
        verify_activity_ref(&state.db, auth_user.id, activity_id).await?;
    }

    let logged_at = body.logged_at.unwrap_or_else(Utc::now);
    let time_of_day = body
        .time_of_day
        .unwrap_or_else(|| TimeOfDay::from_hour(logged_at.hour()));

    let entry = sqlx::query_as::<_, DiaryEntry>(
        r#"
        INSERT INTO diary_entries (
            id, user_id, activity, activity_id,
            mood_before, mood_after, notes, time_of_day, logged_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.activity.trim())
    .bind(body.activity_id)
    .bind(body.mood_before)
    .bind(body.mood_after)
    .bind(&body.notes)
    .bind(time_of_day)
    .bind(logged_at)
    .fetch_one(&state.db)
    .await?;

    // Correctness-critical: the day's aggregate must follow every write.
    mood::recalculate_for_date(&state.db, auth_user.id, entry.logged_at.date_naive()).await?;

    let detail = fetch_detail(&state.db, auth_user.id, entry.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Diary entry created successfully",
            "entry": detail,
        })),
    ))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateDiaryEntryRequest>,
) -> AppResult<Json<serde_json::Value>> {
    validate_entry_fields(
        body.activity.as_deref(),
        body.mood_before,
        body.mood_after,
        body.notes.as_deref(),
    )?;

    if let Some(activity_id) = body.activity_id {
        verify_activity_ref(&state.db, auth_user.id, activity_id).await?;
    }

    let existing = sqlx::query_as::<_, DiaryEntry>(
        "SELECT * FROM diary_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Diary entry not found".into()))?;

    let old_date = existing.logged_at.date_naive();

    let updated = sqlx::query_as::<_, DiaryEntry>(
        r#"
        UPDATE diary_entries SET
            activity = COALESCE($3, activity),
            activity_id = COALESCE($4, activity_id),
            mood_before = COALESCE($5, mood_before),
            mood_after = COALESCE($6, mood_after),
            notes = COALESCE($7, notes),
            time_of_day = COALESCE($8, time_of_day),
            logged_at = COALESCE($9, logged_at),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(body.activity.as_deref().map(str::trim))
    .bind(body.activity_id)
    .bind(body.mood_before)
    .bind(body.mood_after)
    .bind(&body.notes)
    .bind(body.time_of_day)
    .bind(body.logged_at)
    .fetch_one(&state.db)
    .await?;

    // Recompute the old day, and the new day when the entry moved.
    mood::recalculate_for_date(&state.db, auth_user.id, old_date).await?;
    let new_date = updated.logged_at.date_naive();
    if new_date != old_date {
        mood::recalculate_for_date(&state.db, auth_user.id, new_date).await?;
    }

    let detail = fetch_detail(&state.db, auth_user.id, updated.id).await?;
    Ok(Json(json!({
        "message": "Diary entry updated successfully",
        "entry": detail,
    })))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = sqlx::query_as::<_, DiaryEntry>(
        "SELECT * FROM diary_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Diary entry not found".into()))?;

    sqlx::query("DELETE FROM diary_entries WHERE id = $1")
        .bind(existing.id)
        .execute(&state.db)
        .await?;

    mood::recalculate_for_date(&state.db, auth_user.id, existing.logged_at.date_naive()).await?;

    Ok(Json(json!({ "message": "Diary entry deleted successfully" })))
}
