//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::Role;
use super::services::{decode_token, ensure_dev_profile};
use crate::common::{safe_email_log, ApiError, AppState};
use crate::profile::services::ProfileService;

/// Authenticated user extractor
///
/// Validates the bearer JWT and loads id, email and role from `profiles` on
/// every request, so a role change takes effect without a new token.
/// Handlers that merely want to know *if* someone is signed in take
/// `Option<AuthedUser>`.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner of a resource, or an admin acting on it
    pub fn can_manage(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        // DEV MODE: Bypass authentication completely
        if app_state.dev_mode.is_enabled() {
            let profile = ensure_dev_profile(&app_state.db, &app_state.dev_mode).await?;
            debug!(
                user_id = %profile.id,
                email = %safe_email_log(&profile.email),
                role = %profile.role,
                "DEV MODE: Authentication bypassed"
            );
            return Ok(AuthedUser {
                id: profile.id,
                email: profile.email,
                role: profile.role,
            });
        }

        let token = match parts.headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
            Some(t) => t.to_string(),
            None => {
                debug!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = token.strip_prefix("Bearer ").unwrap_or(&token).trim();

        let claims = decode_token(&app_state.config.jwt_secret, bare_token)?;

        let profile = ProfileService::new(app_state.db.clone())
            .find_profile(&claims.sub)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %claims.sub, "Database error during user lookup in authentication");
                e
            })?;

        match profile {
            Some(p) => {
                debug!(
                    user_id = %p.id,
                    email = %safe_email_log(&p.email),
                    role = %p.role,
                    "User authentication successful via extractor"
                );
                Ok(AuthedUser {
                    id: p.id,
                    email: p.email,
                    role: p.role,
                })
            }
            None => {
                warn!(user_id = %claims.sub, "Authentication failed: user not found in database");
                Err(ApiError::Unauthorized("user not found".into()))
            }
        }
    }
}

/// Rejects non-admin callers
pub fn require_admin(authed: &AuthedUser) -> Result<(), ApiError> {
    if authed.is_admin() {
        Ok(())
    } else {
        warn!(user_id = %authed.id, role = %authed.role, "Non-admin attempted admin action");
        Err(ApiError::Forbidden("Admin access required".to_string()))
    }
}
