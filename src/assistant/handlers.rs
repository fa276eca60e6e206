// src/assistant/handlers.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::context::{inventory_snapshot, recent_turns, MAX_HISTORY};
use super::listing::ListingDraft;
use super::models::{AnalyzeListingRequest, ChatRequest, ChatResponse};
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::products::services::ProductsService;
use crate::products::validators::MAX_IMAGES;
use crate::services::ai::prompts::assistant_system_prompt;

/// POST /api/assistant/chat - Stateless assistant turn
///
/// The client owns the conversation; nothing is stored here.
pub async fn chat(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: Option<AuthedUser>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    if request.history.len() > MAX_HISTORY {
        return Err(ApiError::BadRequest(format!(
            "History is limited to {} messages",
            MAX_HISTORY
        )));
    }
    let has_audio = request
        .audio
        .as_ref()
        .map(|a| !a.data.trim().is_empty())
        .unwrap_or(false);
    if request.message.trim().is_empty() && !has_audio {
        return Err(ApiError::BadRequest(
            "Message or audio is required".to_string(),
        ));
    }

    let settings = state.settings_service.load_site_settings().await?;
    let language = request
        .language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| settings.default_language.clone());

    let published = ProductsService::new(state.db.clone()).list_published().await?;
    let system = assistant_system_prompt(
        &settings.site_name,
        &language,
        &inventory_snapshot(&published),
    );

    info!(
        user_id = %authed.as_ref().map(|a| a.id.as_str()).unwrap_or("anonymous"),
        history = request.history.len(),
        inventory = published.len(),
        audio = has_audio,
        "Assistant chat turn"
    );

    let audio = request.audio.as_ref().filter(|_| has_audio);
    let reply = state
        .ai_service
        .chat(&system, recent_turns(&request.history), &request.message, audio)
        .await?;

    Ok(Json(ChatResponse { reply }))
}

/// POST /api/ai/analyze-listing - Moderate the first photo and prefill a listing
pub async fn analyze_listing(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<AnalyzeListingRequest>,
) -> Result<Json<ListingDraft>, ApiError> {
    let state = state_lock.read().await.clone();

    if !authed.role.can_sell() {
        return Err(ApiError::Forbidden(
            "Open a shop before listing products".to_string(),
        ));
    }

    let images: Vec<String> = request
        .images
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    let Some(first) = images.first() else {
        return Err(ApiError::BadRequest("At least one image is required".to_string()));
    };
    if images.len() > MAX_IMAGES {
        return Err(ApiError::BadRequest(
            "At most 10 images are allowed".to_string(),
        ));
    }

    let language = match request.language.filter(|l| !l.trim().is_empty()) {
        Some(language) => language,
        None => state.settings_service.load_site_settings().await?.default_language,
    };

    info!(user_id = %authed.id, images = images.len(), "Analysing listing photo");
    let analysis = state.ai_service.analyze_listing_image(first, &language).await?;

    let draft = ListingDraft::from_analysis(analysis, images)?;
    Ok(Json(draft))
}
