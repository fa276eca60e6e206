// src/admin/routes.rs

use axum::{
    routing::{get, put},
    Router,
};

use super::handlers;

pub fn admin_routes() -> Router {
    Router::new()
        // Site configuration
        .route(
            "/api/site-settings",
            get(handlers::settings::get_public_site_settings),
        )
        .route(
            "/api/admin/site-settings",
            get(handlers::settings::get_site_settings)
                .put(handlers::settings::update_site_settings),
        )
        // Moderation
        .route("/api/admin/users", get(handlers::users::list_users))
        .route(
            "/api/admin/users/:id/role",
            put(handlers::users::update_user_role),
        )
        .route(
            "/api/admin/products",
            get(handlers::products::list_all_products),
        )
}
