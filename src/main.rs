use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

fn router(state: AppState) -> Router {
    // Auth routes with per-IP rate limiting
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        // Account
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/profile", put(handlers::auth::update_profile))
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Diary entries (numeric mood scale)
        .route("/api/diary", get(handlers::diary::list_entries))
        .route("/api/diary", post(handlers::diary::create_entry))
        .route("/api/diary/date/:date", get(handlers::diary::get_entries_by_date))
        .route("/api/diary/:id", get(handlers::diary::get_entry))
        .route("/api/diary/:id", put(handlers::diary::update_entry))
        .route("/api/diary/:id", delete(handlers::diary::delete_entry))
        // Activity catalog
        .route("/api/activities", get(handlers::activities::list_activities))
        .route("/api/activities", post(handlers::activities::create_activity))
        .route(
            "/api/activities/category/:category",
            get(handlers::activities::get_by_category),
        )
        .route(
            "/api/activities/difficulty/:difficulty",
            get(handlers::activities::get_by_difficulty),
        )
        .route("/api/activities/:id", get(handlers::activities::get_activity))
        .route("/api/activities/:id", put(handlers::activities::update_activity))
        .route(
            "/api/activities/:id",
            delete(handlers::activities::delete_activity),
        )
        .route(
            "/api/activities/:id/rank",
            patch(handlers::activities::update_ranking),
        )
        // Mood aggregates (read-only; written by the recompute)
        .route("/api/mood", get(handlers::mood::get_mood_logs))
        .route("/api/mood/stats/summary", get(handlers::mood::get_mood_stats))
        .route("/api/mood/:date", get(handlers::mood::get_mood_log_by_date))
        // Weekly sessions & program progress
        .route("/api/sessions/progress", get(handlers::sessions::get_user_progress))
        .route("/api/sessions/:week_number", get(handlers::sessions::get_session))
        .route(
            "/api/sessions/:week_number/complete",
            post(handlers::sessions::mark_session_read),
        )
        // Baseline diary (free-text mood labels)
        .route("/api/daily-entries", post(handlers::daily_entries::create_entry))
        .route(
            "/api/daily-entries/complete-week",
            post(handlers::daily_entries::complete_week),
        )
        .route(
            "/api/daily-entries/week/:week_number",
            get(handlers::daily_entries::get_week_entries),
        )
        .route(
            "/api/daily-entries/day/:week_number/:day_number",
            get(handlers::daily_entries::get_day_entries),
        )
        .route(
            "/api/daily-entries/:id",
            put(handlers::daily_entries::update_entry),
        )
        .route(
            "/api/daily-entries/:id",
            delete(handlers::daily_entries::delete_entry),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![state
            .config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .unwrap()];
        // In dev, also allow LAN access (e.g. testing from a device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "therapydiary_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let db = db::create_pool(&config.database_url).await;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let state = AppState {
        db,
        config: config.clone(),
        rate_limiter: RateLimitState::new(),
    };

    let app = router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    // into_make_service_with_connect_info provides the client IP used
    // by the auth rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:8081".into(),
            jwt_secret: "test-secret".into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 604800,
        };
        AppState {
            // Lazy pool: no connection is made until a query runs.
            db: PgPool::connect_lazy(&config.database_url).unwrap(),
            config: Arc::new(config),
            rate_limiter: RateLimitState::new(),
        }
    }

    #[tokio::test]
    async fn health_check_responds_ok() {
        let app = router(test_state());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "therapydiary-api");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = router(test_state());

        let response = app
            .oneshot(Request::get("/api/diary").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
