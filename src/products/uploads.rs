// src/products/uploads.rs

use axum::{
    extract::{Extension, Json, Multipart, Path},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::models::UploadedImagesResponse;
use super::validators::MAX_IMAGES;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::services::storage::{MAX_UPLOAD_BYTES, PRODUCT_IMAGES_BUCKET};

/// POST /api/uploads/product-images - Multipart alternative to inline images
///
/// Every file part is stored in order. Nothing is returned until all are stored.
pub async fn upload_product_images(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<Json<UploadedImagesResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    if !authed.role.can_sell() {
        return Err(ApiError::Forbidden(
            "Open a shop before uploading product images".to_string(),
        ));
    }

    let mut files: Vec<(Vec<u8>, String)> = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!(error = %e, "Malformed multipart body");
        ApiError::BadRequest("Invalid multipart data".to_string())
    })? {
        if field.file_name().is_none() {
            continue;
        }
        if files.len() == MAX_IMAGES {
            return Err(ApiError::BadRequest(
                "At most 10 images can be uploaded at once".to_string(),
            ));
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
        files.push((data.to_vec(), content_type));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No image files found".to_string()));
    }

    let mut urls = Vec::with_capacity(files.len());
    for (data, content_type) in files {
        urls.push(
            state
                .storage_service
                .upload(PRODUCT_IMAGES_BUCKET, data, &content_type)
                .await?,
        );
    }

    info!(user_id = %authed.id, count = urls.len(), "Product images uploaded");
    Ok(Json(UploadedImagesResponse { urls }))
}

/// GET /api/storage/:bucket/:filename - Serve a locally stored file
pub async fn serve_file(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let (data, content_type) = state.storage_service.read_local(&bucket, &filename).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000"),
        ],
        data,
    ))
}
