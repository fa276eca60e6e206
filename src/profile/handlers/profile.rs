// src/profile/handlers/profile.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::super::models::{Profile, UpdateProfileRequest};
use super::super::services::ProfileService;
use super::super::validators::ProfileValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};
use crate::services::storage::{is_data_url, AVATARS_BUCKET};

/// GET /api/profile - Get the caller's profile
pub async fn profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();
    let profile = ProfileService::new(state.db.clone()).get_profile(&authed.id).await?;
    Ok(Json(profile))
}

/// PUT /api/profile - Update profile fields
///
/// Shop fields are only writable while the caller can sell.
pub async fn update_profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(mut request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Profile update request received");

    if request.touches_shop() && !authed.role.can_sell() {
        warn!(user_id = %authed.id, role = %authed.role, "Shop fields update without a shop");
        return Err(ApiError::Forbidden(
            "Open a shop before editing shop details".to_string(),
        ));
    }

    let validation = ProfileValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    if let Some(image) = request.shop_image.as_deref().filter(|i| is_data_url(i)) {
        let url = state
            .storage_service
            .upload_data_url(AVATARS_BUCKET, image)
            .await?;
        request.shop_image = Some(url);
    }

    let profile = ProfileService::new(state.db.clone())
        .update_profile(&authed.id, &request)
        .await?;

    info!(user_id = %authed.id, "Profile updated successfully");
    Ok(Json(profile))
}
