use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{Duration, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::{create_token_pair, hash_token, verify_token, TokenType},
    middleware::AuthUser,
    password::{check_password_strength, hash_password, verify_password},
};
use crate::error::{AppError, AppResult};
use crate::models::user::{
    ChangePasswordRequest, LoginRequest, RefreshRequest, RefreshToken, RegisterRequest,
    UpdateProfileRequest, User, UserProfile,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

async fn store_refresh_token(
    db: &sqlx::PgPool,
    user_id: Uuid,
    raw_refresh_token: &str,
    ttl_secs: i64,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(hash_token(raw_refresh_token))
    .bind(Utc::now() + Duration::seconds(ttl_secs))
    .execute(db)
    .await?;

    Ok(())
}

/// Create a token pair AND persist the refresh token hash.
async fn issue_auth_response(
    db: &sqlx::PgPool,
    user: User,
    config: &crate::config::Config,
) -> AppResult<AuthResponse> {
    let tokens = create_token_pair(user.id, &user.email, config)?;
    store_refresh_token(db, user.id, &tokens.refresh_token, config.jwt_refresh_ttl_secs).await?;

    Ok(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: user.into(),
    })
}

async fn revoke_all_user_tokens(db: &sqlx::PgPool, user_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    check_password_strength(&body.password)?;

    let email = body.email.trim().to_lowercase();

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&state.db)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&body.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, name, age)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&password_hash)
    .bind(body.name.trim())
    .bind(body.age)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %user.id, "New user registered");

    let response = issue_auth_response(&state.db, user, &state.config).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(body.email.trim().to_lowercase())
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let response = issue_auth_response(&state.db, user, &state.config).await?;
    Ok(Json(response))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_data = verify_token(&body.refresh_token, &state.config)?;

    if token_data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }

    let stored = sqlx::query_as::<_, RefreshToken>(
        "SELECT * FROM refresh_tokens WHERE token_hash = $1",
    )
    .bind(hash_token(&body.refresh_token))
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if stored.revoked || stored.user_id != token_data.claims.sub {
        return Err(AppError::Unauthorized);
    }

    // Single-use rotation: the presented token is spent.
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
        .bind(stored.id)
        .execute(&state.db)
        .await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(stored.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let response = issue_auth_response(&state.db, user, &state.config).await?;
    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    revoke_all_user_tokens(&state.db, auth_user.id).await?;
    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserProfile>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if let Some(reminder_time) = &body.reminder_time {
        if NaiveTime::parse_from_str(reminder_time, "%H:%M").is_err() {
            return Err(AppError::Validation(
                "Reminder time must be in HH:MM format".into(),
            ));
        }
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            age = COALESCE($3, age),
            notifications = COALESCE($4, notifications),
            reminder_time = COALESCE($5, reminder_time),
            theme = COALESCE($6, theme),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(body.age)
    .bind(body.notifications)
    .bind(&body.reminder_time)
    .bind(&body.theme)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if !verify_password(&body.current_password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    check_password_strength(&body.new_password)?;
    let password_hash = hash_password(&body.new_password)?;

    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user.id)
        .bind(&password_hash)
        .execute(&state.db)
        .await?;

    // Existing sessions must log in again with the new password.
    revoke_all_user_tokens(&state.db, user.id).await?;

    Ok(Json(serde_json::json!({ "message": "Password changed successfully" })))
}
