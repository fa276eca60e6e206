// src/admin/handlers/users.rs

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::admin::models::{RoleChangeResponse, UpdateRoleRequest};
use crate::admin::validators::RoleValidator;
use crate::auth::models::Role;
use crate::auth::{require_admin, AuthedUser};
use crate::common::{ApiError, AppState, Validator};
use crate::profile::models::Profile;
use crate::profile::services::ProfileService;

/// GET /api/admin/users - Every profile
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let state = state_lock.read().await.clone();
    require_admin(&authed)?;

    let profiles = ProfileService::new(state.db.clone()).list_profiles().await?;

    info!(
        admin_user_id = %authed.id,
        user_count = profiles.len(),
        "User list fetched"
    );

    Ok(Json(profiles))
}

/// PUT /api/admin/users/:id/role - Set any role
///
/// Demoting to buyer closes the shop and deletes the user's listings.
pub async fn update_user_role(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    require_admin(&authed)?;

    let validation = RoleValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }
    let role = request
        .role
        .parse::<Role>()
        .map_err(ApiError::ValidationError)?;

    let (profile, deleted_products) = ProfileService::new(state.db.clone())
        .set_role(&user_id, role)
        .await?;

    info!(
        admin_user_id = %authed.id,
        target_user_id = %user_id,
        role = %role,
        deleted_products,
        "User role updated"
    );

    Ok(Json(RoleChangeResponse {
        profile,
        deleted_products,
    }))
}
