// src/products/handlers.rs

use axum::extract::{Extension, Json, Path, Query};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::filter::{MarketplaceFilter, NO_RESULTS_MESSAGE};
use super::models::*;
use super::services::{resolve_images, ProductsService};
use super::validators::{normalize_tags, ProductValidator};
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};

const DEFAULT_CURRENCY: &str = "EUR";

fn parse_field<T: FromStr<Err = String>>(value: &str) -> Result<T, ApiError> {
    value.parse::<T>().map_err(ApiError::ValidationError)
}

fn clean(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn currency_code(value: Option<&str>) -> String {
    value
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

/// Create request to storable fields, images still unresolved
pub fn fields_from_create(request: &CreateProductRequest) -> Result<ProductFields, ApiError> {
    Ok(ProductFields {
        title: request.title.trim().to_string(),
        description: clean(request.description.as_deref()),
        category: parse_field(&request.category)?,
        brand: clean(request.brand.as_deref()),
        condition: parse_field(&request.condition)?,
        price: request.price,
        currency: currency_code(request.currency.as_deref()),
        images: request.images.clone(),
        status: match &request.status {
            Some(status) => parse_field(status)?,
            None => ProductStatus::Published,
        },
        tags: normalize_tags(request.tags.as_deref().unwrap_or_default()),
    })
}

/// Partial update applied over the stored product
pub fn fields_from_update(
    current: &Product,
    request: &UpdateProductRequest,
) -> Result<ProductFields, ApiError> {
    Ok(ProductFields {
        title: request
            .title
            .as_deref()
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| current.title.clone()),
        description: request
            .description
            .as_deref()
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|| current.description.clone()),
        category: match &request.category {
            Some(category) => parse_field(category)?,
            None => current.category,
        },
        brand: request
            .brand
            .as_deref()
            .map(|b| b.trim().to_string())
            .unwrap_or_else(|| current.brand.clone()),
        condition: match &request.condition {
            Some(condition) => parse_field(condition)?,
            None => current.condition,
        },
        price: request.price.unwrap_or(current.price),
        currency: match &request.currency {
            Some(currency) => currency_code(Some(currency)),
            None => current.currency.clone(),
        },
        images: request
            .images
            .clone()
            .unwrap_or_else(|| current.images.clone()),
        status: match &request.status {
            Some(status) => parse_field(status)?,
            None => current.status,
        },
        tags: match &request.tags {
            Some(tags) => normalize_tags(tags),
            None => current.tags.clone(),
        },
    })
}

/// Owner or admin, otherwise 403
fn ensure_can_manage(authed: &AuthedUser, product: &Product) -> Result<(), ApiError> {
    if authed.can_manage(&product.user_id) {
        Ok(())
    } else {
        warn!(user_id = %authed.id, product_id = %product.id, "Product access denied");
        Err(ApiError::Forbidden(
            "Only the owner or an admin can change this product".to_string(),
        ))
    }
}

/// GET /api/products?q=&category= - Marketplace listing
pub async fn list_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let published = ProductsService::new(state.db.clone()).list_published().await?;
    let products = MarketplaceFilter::from_query(&params).apply(&published);
    let message = products
        .is_empty()
        .then(|| NO_RESULTS_MESSAGE.to_string());

    Ok(Json(ProductListResponse {
        total: products.len(),
        products,
        message,
    }))
}

/// GET /api/products/:id - Product detail
///
/// Drafts and sold items are only visible to their owner or an admin.
pub async fn get_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(id): Path<String>,
    authed: Option<AuthedUser>,
) -> Result<Json<Product>, ApiError> {
    let state = state_lock.read().await.clone();
    let product = ProductsService::new(state.db.clone()).get_product(&id).await?;

    let visible = product.status == ProductStatus::Published
        || authed
            .as_ref()
            .map(|a| a.can_manage(&product.user_id))
            .unwrap_or(false);
    if !visible {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    Ok(Json(product))
}

/// GET /api/products/mine - Every listing of the caller
pub async fn my_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    let state = state_lock.read().await.clone();
    let products = ProductsService::new(state.db.clone())
        .list_by_owner(&authed.id)
        .await?;
    Ok(Json(products))
}

/// POST /api/products - Create a listing (seller or admin)
pub async fn create_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let state = state_lock.read().await.clone();

    if !authed.role.can_sell() {
        warn!(user_id = %authed.id, role = %authed.role, "Product creation without a shop");
        return Err(ApiError::Forbidden(
            "Open a shop before listing products".to_string(),
        ));
    }

    let validation = ProductValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let mut fields = fields_from_create(&request)?;
    fields.images = resolve_images(&state.storage_service, &fields.images).await?;

    let product = ProductsService::new(state.db.clone())
        .create_product(&authed.id, &fields)
        .await?;

    Ok(Json(product))
}

/// PUT /api/products/:id - Partial update by the owner or an admin
pub async fn update_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProductsService::new(state.db.clone());

    let current = service.get_product(&id).await?;
    ensure_can_manage(&authed, &current)?;

    let validation = ProductValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let mut fields = fields_from_update(&current, &request)?;
    if request.images.is_some() {
        fields.images = resolve_images(&state.storage_service, &fields.images).await?;
    }

    let product = service.update_product(&id, &fields).await?;
    Ok(Json(product))
}

/// PATCH /api/products/:id/status - Any transition, owner or admin
pub async fn update_product_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Product>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProductsService::new(state.db.clone());

    let validation = ProductValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let current = service.get_product(&id).await?;
    ensure_can_manage(&authed, &current)?;

    let product = service
        .set_status(&id, parse_field(&request.status)?)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/:id
pub async fn delete_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let service = ProductsService::new(state.db.clone());

    let current = service.get_product(&id).await?;
    ensure_can_manage(&authed, &current)?;
    service.delete_product(&id).await?;

    info!(user_id = %authed.id, product_id = %id, "Product removed by request");
    Ok(Json(serde_json::json!({
        "message": "Product deleted"
    })))
}
