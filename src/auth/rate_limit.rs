use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

/// Per-IP budget for the register/login endpoints.
const MAX_REQUESTS: u32 = 10;
const WINDOW_SECS: u64 = 60;

/// In-memory rate limit state (single-instance deployments).
#[derive(Clone, Default)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a hit for `key`. Returns the remaining budget, or Err when
    /// the window is exhausted.
    pub async fn check(&self, key: &str, max_requests: u32, window_secs: u64) -> Result<u32, ()> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= max_requests {
            return Err(());
        }

        entry.count += 1;
        Ok(max_requests - entry.count)
    }
}

pub async fn rate_limit_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = format!("auth:{}", addr.ip());

    if state
        .rate_limiter
        .check(&key, MAX_REQUESTS, WINDOW_SECS)
        .await
        .is_err()
    {
        tracing::warn!(ip = %addr.ip(), "Auth rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_limit() {
        let limiter = RateLimitState::new();
        for _ in 0..3 {
            assert!(limiter.check("k", 3, 60).await.is_ok());
        }
        assert!(limiter.check("k", 3, 60).await.is_err());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimitState::new();
        for _ in 0..3 {
            limiter.check("a", 3, 60).await.ok();
        }
        assert!(limiter.check("a", 3, 60).await.is_err());
        assert!(limiter.check("b", 3, 60).await.is_ok());
    }

    #[tokio::test]
    async fn remaining_budget_counts_down() {
        let limiter = RateLimitState::new();
        assert_eq!(limiter.check("k", 3, 60).await, Ok(2));
        assert_eq!(limiter.check("k", 3, 60).await, Ok(1));
        assert_eq!(limiter.check("k", 3, 60).await, Ok(0));
    }
}
