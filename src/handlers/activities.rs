use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::activity::{
    Activity, ActivityCategory, ActivityDifficulty, ActivityQuery, CreateActivityRequest,
    RankRequest, UpdateActivityRequest,
};
use crate::models::Pagination;
use crate::AppState;

fn parse_category(s: &str) -> AppResult<ActivityCategory> {
    ActivityCategory::parse(s).ok_or_else(|| {
        AppError::Validation("Category must be Routine, Necessary, or Pleasurable".into())
    })
}

fn parse_difficulty(s: &str) -> AppResult<ActivityDifficulty> {
    ActivityDifficulty::parse(s).ok_or_else(|| {
        AppError::Validation("Difficulty must be Easiest, Moderate, or Difficult".into())
    })
}

fn validate_activity_fields(
    name: Option<&str>,
    description: Option<&str>,
    estimated_duration: Option<i32>,
) -> AppResult<()> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Activity name is required".into()));
        }
        if name.len() > 200 {
            return Err(AppError::Validation(
                "Activity name cannot exceed 200 characters".into(),
            ));
        }
    }
    if let Some(description) = description {
        if description.len() > 500 {
            return Err(AppError::Validation(
                "Description cannot exceed 500 characters".into(),
            ));
        }
    }
    if let Some(duration) = estimated_duration {
        if !(1..=480).contains(&duration) {
            return Err(AppError::Validation(
                "Duration must be between 1 minute and 8 hours".into(),
            ));
        }
    }
    Ok(())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// List the shared catalog plus the caller's active custom activities.
pub async fn list_activities(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let category = query.category.as_deref().map(parse_category).transpose()?;
    let difficulty = query
        .difficulty
        .as_deref()
        .map(parse_difficulty)
        .transpose()?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = (page - 1) * limit;

    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT * FROM activities
        WHERE (user_id IS NULL OR (user_id = $1 AND is_active = TRUE))
          AND ($2::activity_category IS NULL OR category = $2)
          AND ($3::activity_difficulty IS NULL OR difficulty = $3)
          AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%' OR description ILIKE '%' || $4 || '%')
        ORDER BY category ASC, difficulty ASC, name ASC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(auth_user.id)
    .bind(category)
    .bind(difficulty)
    .bind(&query.search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM activities
        WHERE (user_id IS NULL OR (user_id = $1 AND is_active = TRUE))
          AND ($2::activity_category IS NULL OR category = $2)
          AND ($3::activity_difficulty IS NULL OR difficulty = $3)
          AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%' OR description ILIKE '%' || $4 || '%')
        "#,
    )
    .bind(auth_user.id)
    .bind(category)
    .bind(difficulty)
    .bind(&query.search)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({
        "activities": activities,
        "pagination": Pagination::new(page, limit, total),
    })))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(activity_id): Path<Uuid>,
) -> AppResult<Json<Activity>> {
    let activity = sqlx::query_as::<_, Activity>(
        r#"
        SELECT * FROM activities
        WHERE id = $1 AND (user_id IS NULL OR (user_id = $2 AND is_active = TRUE))
        "#,
    )
    .bind(activity_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Activity not found".into()))?;

    Ok(Json(activity))
}

pub async fn create_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateActivityRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    validate_activity_fields(
        Some(&body.name),
        body.description.as_deref(),
        body.estimated_duration,
    )?;

    let tags = normalize_tags(body.tags.unwrap_or_default());

    let activity = sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (
            id, user_id, name, category, difficulty,
            description, estimated_duration, tags, is_custom
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.name.trim())
    .bind(body.category)
    .bind(body.difficulty.unwrap_or_default())
    .bind(&body.description)
    .bind(body.estimated_duration)
    .bind(&tags)
    .fetch_one(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Activity created successfully",
            "activity": activity,
        })),
    ))
}

/// Only a user's own custom activities can be edited.
pub async fn update_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(activity_id): Path<Uuid>,
    Json(body): Json<UpdateActivityRequest>,
) -> AppResult<Json<serde_json::Value>> {
    validate_activity_fields(
        body.name.as_deref(),
        body.description.as_deref(),
        body.estimated_duration,
    )?;

    let tags = body.tags.map(normalize_tags);

    let activity = sqlx::query_as::<_, Activity>(
        r#"
        UPDATE activities SET
            name = COALESCE($3, name),
            category = COALESCE($4, category),
            difficulty = COALESCE($5, difficulty),
            description = COALESCE($6, description),
            estimated_duration = COALESCE($7, estimated_duration),
            tags = COALESCE($8, tags),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND is_custom = TRUE
        RETURNING *
        "#,
    )
    .bind(activity_id)
    .bind(auth_user.id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(body.category)
    .bind(body.difficulty)
    .bind(&body.description)
    .bind(body.estimated_duration)
    .bind(&tags)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Activity not found".into()))?;

    Ok(Json(json!({
        "message": "Activity updated successfully",
        "activity": activity,
    })))
}

/// Soft delete: the activity disappears from listings but diary entries
/// that reference it keep their link.
pub async fn delete_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(activity_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE activities SET is_active = FALSE, updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND is_custom = TRUE
        RETURNING id
        "#,
    )
    .bind(activity_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?;

    if deleted.is_none() {
        return Err(AppError::NotFound("Activity not found".into()));
    }

    Ok(Json(json!({ "message": "Activity deleted successfully" })))
}

pub async fn get_by_category(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(category): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let category = parse_category(&category)?;

    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT * FROM activities
        WHERE category = $1 AND (user_id IS NULL OR (user_id = $2 AND is_active = TRUE))
        ORDER BY difficulty ASC, name ASC
        "#,
    )
    .bind(category)
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "category": category,
        "count": activities.len(),
        "activities": activities,
    })))
}

pub async fn get_by_difficulty(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(difficulty): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let difficulty = parse_difficulty(&difficulty)?;

    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT * FROM activities
        WHERE difficulty = $1 AND (user_id IS NULL OR (user_id = $2 AND is_active = TRUE))
        ORDER BY category ASC, name ASC
        "#,
    )
    .bind(difficulty)
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "difficulty": difficulty,
        "count": activities.len(),
        "activities": activities,
    })))
}

/// Re-rank a custom activity's difficulty (the week 3 task).
pub async fn update_ranking(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(activity_id): Path<Uuid>,
    Json(body): Json<RankRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let difficulty = parse_difficulty(&body.difficulty)?;

    let activity = sqlx::query_as::<_, Activity>(
        r#"
        UPDATE activities SET difficulty = $3, updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND is_custom = TRUE
        RETURNING *
        "#,
    )
    .bind(activity_id)
    .bind(auth_user.id)
    .bind(difficulty)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Activity not found".into()))?;

    Ok(Json(json!({
        "message": "Activity ranking updated successfully",
        "activity": activity,
    })))
}
