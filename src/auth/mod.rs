//! # Auth Module
//!
//! Sign-in and identity:
//! - Email/password accounts (bcrypt)
//! - Google ID token and GitHub OAuth sign-in
//! - JWT session tokens
//! - `AuthedUser` extractor carrying the caller's role

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

pub use extractors::{require_admin, AuthedUser};
pub use models::Role;
pub use routes::auth_routes;
