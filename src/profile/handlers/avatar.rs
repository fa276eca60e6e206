// src/profile/handlers/avatar.rs

use axum::extract::{Extension, Json, Multipart};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::super::models::{AvatarUploadResponse, MessageResponse};
use super::super::services::ProfileService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::services::storage::{AVATARS_BUCKET, MAX_UPLOAD_BYTES};

/// POST /api/user/avatar - Upload avatar
pub async fn upload_avatar(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<Json<AvatarUploadResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Avatar upload initiated");

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!(error = %e, "Malformed multipart body");
        ApiError::BadRequest("Invalid multipart data".to_string())
    })? {
        if field.name() != Some("avatar") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file data".to_string()))?;

        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::BadRequest(
                "File size exceeds 10MB limit".to_string(),
            ));
        }

        let avatar_url = state
            .storage_service
            .upload(AVATARS_BUCKET, data.to_vec(), &content_type)
            .await?;

        let profiles = ProfileService::new(state.db.clone());
        let previous = profiles.get_profile(&authed.id).await?.avatar_url;
        profiles.set_avatar(&authed.id, Some(&avatar_url)).await?;
        if let Some(previous) = previous {
            state.storage_service.delete_local_by_url(&previous).await;
        }

        info!(user_id = %authed.id, avatar_url = %avatar_url, "Avatar uploaded successfully");

        return Ok(Json(AvatarUploadResponse {
            avatar_url,
            message: "Avatar uploaded successfully".to_string(),
        }));
    }

    Err(ApiError::BadRequest("No avatar file found".to_string()))
}

/// DELETE /api/user/avatar - Remove avatar
pub async fn remove_avatar(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let profiles = ProfileService::new(state.db.clone());
    let current = profiles.get_profile(&authed.id).await?;
    profiles.set_avatar(&authed.id, None).await?;
    if let Some(url) = current.avatar_url {
        state.storage_service.delete_local_by_url(&url).await;
    }

    info!(user_id = %authed.id, "Avatar removed successfully");

    Ok(Json(MessageResponse {
        message: "Avatar removed successfully".to_string(),
    }))
}
