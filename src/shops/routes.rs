// src/shops/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn shops_routes() -> Router {
    Router::new()
        .route("/api/shops", get(handlers::list_shops))
        .route("/api/shops/:id", get(handlers::get_shop))
}
