// src/shops/handlers.rs

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{ShopDetail, ShopSummary};
use super::services::ShopsService;
use crate::common::{ApiError, AppState};

/// GET /api/shops - Shop directory
pub async fn list_shops(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<Vec<ShopSummary>>, ApiError> {
    let state = state_lock.read().await.clone();
    let shops = ShopsService::new(state.db).list_shops().await?;
    Ok(Json(shops))
}

/// GET /api/shops/:id - Storefront of one seller
pub async fn get_shop(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(seller_id): Path<String>,
) -> Result<Json<ShopDetail>, ApiError> {
    let state = state_lock.read().await.clone();
    let shop = ShopsService::new(state.db)
        .get_shop(&seller_id)
        .await?;
    Ok(Json(shop))
}
