// src/assistant/routes.rs

use axum::{routing::post, Router};

use super::handlers;

pub fn assistant_routes() -> Router {
    Router::new()
        .route("/api/assistant/chat", post(handlers::chat))
        .route("/api/ai/analyze-listing", post(handlers::analyze_listing))
}
