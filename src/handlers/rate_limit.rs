use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::metrics::RATE_LIMITED_TOTAL;
use crate::models::{LoginRateLimitRequest, RateLimitRequest};
use crate::rate_limit::{RateLimitConfig, RateLimitResult};
use crate::state::AppState;

fn require_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(AppError::InvalidConfig("identifier must not be empty".into()));
    }
    Ok(())
}

fn observe(identifier: &str, result: &RateLimitResult) {
    if result.limited {
        RATE_LIMITED_TOTAL.inc();
        warn!(identifier, reset_time = result.reset_time, "Rate limit exceeded");
    }
}

pub async fn check_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RateLimitRequest>,
) -> Result<Json<RateLimitResult>> {
    require_identifier(&payload.identifier)?;

    let config = RateLimitConfig::new(
        payload.window_ms.unwrap_or(state.default_limit.window_ms),
        payload.max_requests.unwrap_or(state.default_limit.max_requests),
    )?;

    let result = state.rate_limiter.check(&payload.identifier, &config);
    observe(&payload.identifier, &result);

    Ok(Json(result))
}

pub async fn login_check_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRateLimitRequest>,
) -> Result<Json<RateLimitResult>> {
    require_identifier(&payload.identifier)?;

    let result = state.rate_limiter.check_login(&payload.identifier);
    observe(&payload.identifier, &result);

    Ok(Json(result))
}
