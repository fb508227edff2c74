use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::models::{EffectivePermissions, PermissionResponse};
use crate::state::AppState;

pub async fn user_permission_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, slug)): Path<(String, String)>,
) -> Result<Json<PermissionResponse>> {
    let allowed = state.permissions.has_permission(&user_id, &slug)?;

    Ok(Json(PermissionResponse {
        user_id: Some(user_id),
        permission: slug,
        allowed,
    }))
}

pub async fn effective_permissions_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<EffectivePermissions>> {
    let mut permissions: Vec<String> = state
        .permissions
        .effective_permissions(&user_id)?
        .into_iter()
        .collect();
    permissions.sort();

    Ok(Json(EffectivePermissions {
        user_id,
        permissions,
    }))
}

// Permission check for whoever is calling
pub async fn my_permission_handler(
    State(state): State<Arc<AppState>>,
    current: Option<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<Json<PermissionResponse>> {
    let allowed = state.permissions.check_permission(current.as_ref(), &slug)?;

    Ok(Json(PermissionResponse {
        user_id: current.map(|user| user.id),
        permission: slug,
        allowed,
    }))
}
