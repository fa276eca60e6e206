//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/signup` - Email/password account creation
/// - `POST /api/auth/login` - Email/password sign-in
/// - `POST /api/auth/google` - Google ID token sign-in
/// - `GET /api/auth/github` - Start GitHub OAuth
/// - `GET /api/auth/github/callback` - GitHub OAuth callback
/// - `POST /api/auth/logout` - Logout (client-side token removal)
/// - `GET /api/me` - Current profile
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::signup_handler))
        .route("/api/auth/login", post(handlers::login_handler))
        .route("/api/auth/google", post(handlers::google_auth))
        .route("/api/auth/github", get(handlers::github_oauth_start))
        .route("/api/auth/github/callback", get(handlers::github_oauth_callback))
        .route("/api/auth/logout", post(handlers::logout_handler))
        .route("/api/me", get(handlers::me_handler))
}
