// src/admin/handlers/settings.rs

use axum::{extract::Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::admin::validators::SiteSettingsValidator;
use crate::auth::{require_admin, AuthedUser};
use crate::common::{ApiError, AppState, Validator};
use crate::services::settings::{PublicSiteSettings, SiteSettings};

/// GET /api/site-settings - Public subset, read by clients at start-up
pub async fn get_public_site_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<PublicSiteSettings>, ApiError> {
    let state = state_lock.read().await.clone();

    let settings = state
        .settings_service
        .load_site_settings()
        .await
        .map_err(|e| {
            error!(error = %e, "Error loading public site settings");
            ApiError::from(e)
        })?;

    Ok(Json(settings.public()))
}

/// GET /api/admin/site-settings - Full record with API keys masked
pub async fn get_site_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<SiteSettings>, ApiError> {
    let state = state_lock.read().await.clone();
    require_admin(&authed)?;

    info!(admin_user_id = %authed.id, "Fetching site settings");

    let settings = state.settings_service.load_site_settings().await?;
    Ok(Json(settings.masked()))
}

/// PUT /api/admin/site-settings - Wholesale rewrite
///
/// Blank or masked API keys keep the stored key.
pub async fn update_site_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(mut request): Json<SiteSettings>,
) -> Result<Json<SiteSettings>, ApiError> {
    let state = state_lock.read().await.clone();
    require_admin(&authed)?;

    request.ai_provider = request.ai_provider.trim().to_lowercase();
    let validation = SiteSettingsValidator.validate(&request);
    if !validation.is_valid {
        warn!(admin_user_id = %authed.id, "Rejected site settings update");
        return Err(validation.into());
    }

    if !state.settings_service.is_encryption_available() {
        warn!(
            admin_user_id = %authed.id,
            "ENCRYPTION_MASTER_KEY not set, API keys are stored in plain text"
        );
    }

    let saved = state
        .settings_service
        .save_site_settings(&request, Some(&authed.id))
        .await?;

    info!(
        admin_user_id = %authed.id,
        ai_provider = %saved.ai_provider,
        "Site settings updated"
    );

    Ok(Json(saved.masked()))
}
