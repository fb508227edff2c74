// Rate limiting and role-based permission checks for the newsroom platform,
// as a library plus a small axum service around it.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use std::sync::Arc;

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod rate_limit;
pub mod state;
pub mod sweeper;

use handlers::{
    assign_role_handler, check_handler, effective_permissions_handler, grant_permission_handler,
    health_handler, login_check_handler, metrics_handler, my_permission_handler,
    revoke_permission_handler, revoke_role_handler, user_permission_handler,
};
use middleware::rate_limit_layer;
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/rate-limit/check", post(check_handler))
        .route("/rate-limit/login", post(login_check_handler))
        .route("/users/{user_id}/permissions", get(effective_permissions_handler))
        .route(
            "/users/{user_id}/permissions/{slug}",
            get(user_permission_handler),
        )
        .route("/me/permissions/{slug}", get(my_permission_handler))
        .route(
            "/users/{user_id}/roles/{role_id}",
            put(assign_role_handler).delete(revoke_role_handler),
        )
        .route(
            "/roles/{role_id}/permissions/{slug}",
            put(grant_permission_handler).delete(revoke_permission_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_layer,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .with_state(state)
}
