use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::models::MutationResponse;
use crate::state::AppState;

const MANAGE_ROLES: &str = "role.update";
const MANAGE_PERMISSIONS: &str = "permission.update";

pub async fn assign_role_handler(
    State(state): State<Arc<AppState>>,
    current: Option<CurrentUser>,
    Path((user_id, role_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>> {
    state
        .permissions
        .require_permission(current.as_ref(), MANAGE_ROLES)?;

    let changed = state.directory.assign_role(&user_id, &role_id);
    if changed {
        info!(%user_id, %role_id, "Role assigned");
    }
    Ok(Json(MutationResponse { changed }))
}

pub async fn revoke_role_handler(
    State(state): State<Arc<AppState>>,
    current: Option<CurrentUser>,
    Path((user_id, role_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>> {
    state
        .permissions
        .require_permission(current.as_ref(), MANAGE_ROLES)?;

    let changed = state.directory.revoke_role(&user_id, &role_id);
    if changed {
        info!(%user_id, %role_id, "Role revoked");
    }
    Ok(Json(MutationResponse { changed }))
}

pub async fn grant_permission_handler(
    State(state): State<Arc<AppState>>,
    current: Option<CurrentUser>,
    Path((role_id, slug)): Path<(String, String)>,
) -> Result<Json<MutationResponse>> {
    state
        .permissions
        .require_permission(current.as_ref(), MANAGE_PERMISSIONS)?;

    let changed = state.directory.grant_permission(&role_id, &slug)?;
    if changed {
        info!(%role_id, %slug, "Permission granted");
    }
    Ok(Json(MutationResponse { changed }))
}

pub async fn revoke_permission_handler(
    State(state): State<Arc<AppState>>,
    current: Option<CurrentUser>,
    Path((role_id, slug)): Path<(String, String)>,
) -> Result<Json<MutationResponse>> {
    state
        .permissions
        .require_permission(current.as_ref(), MANAGE_PERMISSIONS)?;

    let changed = state.directory.revoke_permission(&role_id, &slug);
    if changed {
        info!(%role_id, %slug, "Permission revoked");
    }
    Ok(Json(MutationResponse { changed }))
}
