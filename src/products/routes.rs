// src/products/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::{handlers, uploads};

/// Create the products router
pub fn products_routes() -> Router {
    Router::new()
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/api/products/mine", get(handlers::my_products))
        .route(
            "/api/products/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/api/products/:id/status", patch(handlers::update_product_status))
        // Image storage
        .route("/api/uploads/product-images", post(uploads::upload_product_images))
        .route("/api/storage/:bucket/:filename", get(uploads::serve_file))
}
