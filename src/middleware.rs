use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::auth::client_identifier;
use crate::error::AppError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL};
use crate::rate_limit::RateLimitResult;
use crate::state::AppState;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

fn api_key(client: &str) -> String {
    format!("api:{client}")
}

fn set_headers(headers: &mut HeaderMap, limit: u32, result: &RateLimitResult) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(result.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(result.reset_time));
}

// Per-client fixed-window limit in front of every /api route
pub async fn rate_limit_layer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let client = if state.trust_proxy {
        client_identifier(request.headers(), &peer)
    } else {
        peer
    };

    let limit = state.default_limit;
    let result = state.api_limiter.check(&api_key(&client), &limit);

    if result.limited {
        RATE_LIMITED_TOTAL.inc();
        warn!(%client, path = %request.uri().path(), "Rate limit exceeded");

        let retry_after_secs = result.retry_after_secs(state.api_limiter.now_ms());
        let mut response = AppError::RateLimited { retry_after_secs }.into_response();
        set_headers(response.headers_mut(), limit.max_requests, &result);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        return response;
    }

    let mut response = next.run(request).await;
    set_headers(response.headers_mut(), limit.max_requests, &result);
    response
}
