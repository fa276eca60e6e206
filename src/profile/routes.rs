// src/profile/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{avatar, profile, shop};

pub fn profile_routes() -> Router {
    Router::new()
        .route(
            "/api/profile",
            get(profile::profile_handler).put(profile::update_profile_handler),
        )
        .route(
            "/api/user/avatar",
            post(avatar::upload_avatar).delete(avatar::remove_avatar),
        )
        // Shop lifecycle
        .route("/api/shop", post(shop::open_shop).delete(shop::close_shop))
        .route("/api/ai/shop-profile", post(shop::generate_shop_profile))
}
