// src/admin/handlers/products.rs

use axum::{extract::Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{require_admin, AuthedUser};
use crate::common::{ApiError, AppState};
use crate::products::models::Product;
use crate::products::services::ProductsService;

/// GET /api/admin/products - Every product in any status
pub async fn list_all_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    let state = state_lock.read().await.clone();
    require_admin(&authed)?;

    let products = ProductsService::new(state.db.clone()).list_all().await?;
    Ok(Json(products))
}
