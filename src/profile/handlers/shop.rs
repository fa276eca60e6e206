// src/profile/handlers/shop.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::super::models::{CloseShopResponse, OpenShopRequest, Profile, ShopProfileRequest};
use super::super::services::ProfileService;
use super::super::validators::ShopValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};
use crate::services::ai::ShopProfileSuggestion;
use crate::services::storage::{is_data_url, AVATARS_BUCKET};

/// POST /api/shop - Open a shop; a buyer becomes a seller
pub async fn open_shop(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<OpenShopRequest>,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = ShopValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let shop_image = match request.shop_image.as_deref().map(str::trim) {
        Some(image) if is_data_url(image) => Some(
            state
                .storage_service
                .upload_data_url(AVATARS_BUCKET, image)
                .await?,
        ),
        other => other.map(str::to_string),
    };

    let profile = ProfileService::new(state.db.clone())
        .open_shop(
            &authed.id,
            &request.shop_name,
            request.shop_description.as_deref(),
            shop_image.as_deref(),
        )
        .await?;

    Ok(Json(profile))
}

/// DELETE /api/shop - Close the shop, deleting every listing of the caller
pub async fn close_shop(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<CloseShopResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let profiles = ProfileService::new(state.db.clone());

    let deleted_products = profiles.close_shop(&authed.id).await?;
    let profile = profiles.get_profile(&authed.id).await?;

    Ok(Json(CloseShopResponse {
        deleted_products,
        profile,
    }))
}

/// POST /api/ai/shop-profile - Suggest a shop name and description
pub async fn generate_shop_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<ShopProfileRequest>,
) -> Result<Json<ShopProfileSuggestion>, ApiError> {
    let state = state_lock.read().await.clone();

    let language = match request.language.filter(|l| !l.trim().is_empty()) {
        Some(language) => language,
        None => state.settings_service.load_site_settings().await?.default_language,
    };

    info!(user_id = %authed.id, language = %language, "Generating shop profile");

    let suggestion = state
        .ai_service
        .generate_shop_profile(
            request.prompt.as_deref(),
            request.image.as_deref(),
            &language,
        )
        .await?;

    Ok(Json(suggestion))
}
