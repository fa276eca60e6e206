//! Authentication handlers

use axum::extract::{Extension, Json, Query};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::extractors::AuthedUser;
use super::models::{
    AuthResponse, GoogleIdTokenPayload, LoginRequest, OAuthCallbackQuery, OAuthIdentity,
    SignupRequest,
};
use super::services::{
    bootstrap_admin, create_account, expired_oauth_nonce_cookie, find_user_by_email,
    initial_role, issue_token, normalize_email, oauth_nonce_cookie, oauth_nonce_from_headers,
    sign_oauth_state, upsert_oauth_identity, verify_oauth_state, NewAccount,
};
use crate::common::config::GithubOAuthConfig;
use crate::common::{safe_email_log, ApiError, AppState, ValidationResult};
use crate::profile::models::Profile;
use crate::profile::services::ProfileService;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_API_URL: &str = "https://api.github.com";
const MIN_PASSWORD_LEN: usize = 8;

fn session_response(state: &AppState, profile: Profile) -> Result<Json<AuthResponse>, ApiError> {
    let token = issue_token(&state.config.jwt_secret, &profile.id)?;
    Ok(Json(AuthResponse {
        token,
        user: profile,
    }))
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    let mut result = ValidationResult::new();
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.len() > 254 {
        result.add_error("email", "A valid email is required");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        result.add_error("password", "Password must be at least 8 characters");
    }
    result.into_result().map_err(ApiError::from)
}

/// POST /api/auth/signup
/// Creates an email/password account and returns a session
pub async fn signup_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    validate_credentials(&payload.email, &payload.password)?;

    let email = normalize_email(&payload.email);
    if find_user_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %safe_email_log(&email), "Signup with an existing email");
        return Err(ApiError::BadRequest("An account with this email already exists".to_string()));
    }

    let password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| ApiError::InternalServer(e.to_string()))?
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ApiError::InternalServer("Password hashing failed".to_string())
        })?;

    let profile = create_account(
        &state.db,
        NewAccount {
            email: &email,
            password_hash: Some(&password_hash),
            provider: "email",
            full_name: payload.full_name.as_deref(),
            ..NewAccount::default()
        },
        initial_role(&state.config, &email),
    )
    .await?;

    session_response(&state, profile)
}

/// POST /api/auth/login
pub async fn login_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = find_user_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid)?;
    let Some(hash) = user.password_hash.clone() else {
        warn!(user_id = %user.id, provider = %user.provider, "Password login on an OAuth-only account");
        return Err(invalid());
    };

    let password = payload.password.clone();
    let is_valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::InternalServer(e.to_string()))?
        .unwrap_or(false);
    if !is_valid {
        warn!(user_id = %user.id, "Password mismatch");
        return Err(invalid());
    }

    let profile = ProfileService::new(state.db.clone()).get_profile(&user.id).await?;
    let profile = bootstrap_admin(&state.db, &state.config, profile).await?;

    info!(user_id = %profile.id, email = %safe_email_log(&profile.email), "User logged in");
    session_response(&state, profile)
}

/// POST /api/auth/google
/// Authenticates a user via a Google ID token
pub async fn google_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<GoogleIdTokenPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    // Docs: https://developers.google.com/identity/sign-in/web/backend-auth
    debug!("Initiating Google token validation with tokeninfo endpoint");
    let resp = state
        .http
        .get(GOOGLE_TOKENINFO_URL)
        .query(&[("id_token", payload.id_token.as_str())])
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP error contacting Google tokeninfo endpoint");
            ApiError::BadGateway("google token validation service unavailable".to_string())
        })?;

    let status = resp.status();
    if !status.is_success() {
        warn!(http_status = %status, "Google tokeninfo rejected the token");
        return Err(match status.as_u16() {
            401 => ApiError::Unauthorized("expired or invalid id_token".to_string()),
            _ => ApiError::BadRequest("invalid or malformed id_token".to_string()),
        });
    }

    let body: serde_json::Value = resp.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse Google tokeninfo JSON response");
        ApiError::BadRequest("malformed id_token".to_string())
    })?;

    let identity = google_identity(&body, state.config.google_client_id.as_deref())?;
    let profile = upsert_oauth_identity(&state, identity).await?;

    info!(user_id = %profile.id, provider = "google", "User authentication successful via Google");
    session_response(&state, profile)
}

/// Checks a tokeninfo payload and pulls the identity out of it
pub fn google_identity(body: &serde_json::Value, client_id: Option<&str>) -> Result<OAuthIdentity, ApiError> {
    let field = |name: &str| body.get(name).and_then(|v| v.as_str()).map(str::to_string);

    let (Some(email), Some(sub)) = (field("email"), field("sub")) else {
        warn!("Google token missing required fields (email/sub)");
        return Err(ApiError::BadRequest("token missing required fields".to_string()));
    };

    // tokeninfo encodes booleans and numbers as strings
    let verified = body
        .get("email_verified")
        .map(|v| v.as_bool().unwrap_or_else(|| v.as_str() == Some("true")))
        .unwrap_or(false);
    if !verified {
        warn!(email = %safe_email_log(&email), "Google token has an unverified email");
        return Err(ApiError::Unauthorized("email not verified".to_string()));
    }

    let exp = body
        .get("exp")
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())));
    if let Some(exp) = exp {
        if exp < Utc::now().timestamp() {
            warn!(token_exp = exp, "Google token has expired");
            return Err(ApiError::Unauthorized("token has expired".to_string()));
        }
    }

    if let Some(client_id) = client_id {
        if field("aud").as_deref() != Some(client_id) {
            warn!(expected_client_id = %client_id, "Google token audience validation failed");
            return Err(ApiError::Unauthorized("token audience mismatch".to_string()));
        }
    }

    Ok(OAuthIdentity {
        provider: "google",
        provider_id: sub,
        email: normalize_email(&email),
        full_name: field("name"),
        avatar_url: field("picture"),
    })
}

fn github_config(state: &AppState) -> Result<&GithubOAuthConfig, ApiError> {
    state
        .config
        .github
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("GitHub sign-in is not configured".to_string()))
}

/// GET /api/auth/github - Start the GitHub OAuth flow
pub async fn github_oauth_start(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    let github = github_config(&state)?;
    let (oauth_state, nonce) = sign_oauth_state(&state.config.jwt_secret)?;
    let cookie = oauth_nonce_cookie(&nonce, github.redirect_uri.starts_with("https://"));

    let url = format!(
        "{}?client_id={}&redirect_uri={}&scope={}&state={}",
        GITHUB_AUTHORIZE_URL,
        urlencoding::encode(&github.client_id),
        urlencoding::encode(&github.redirect_uri),
        urlencoding::encode("read:user user:email"),
        urlencoding::encode(&oauth_state),
    );

    info!("Redirecting to GitHub OAuth");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&url)).into_response())
}

#[derive(Deserialize)]
struct GithubTokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// GET /api/auth/github/callback
/// Finishes the GitHub flow and hands the session to the client in the URL fragment
pub async fn github_oauth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    Query(params): Query<OAuthCallbackQuery>,
) -> Response {
    let state = state_lock.read().await.clone();
    let callback = format!("{}/auth/callback", state.config.frontend_url);
    let browser_nonce = oauth_nonce_from_headers(&headers);

    let redirect = match github_login(&state, params, browser_nonce.as_deref()).await {
        Ok(token) => Redirect::to(&format!("{}#token={}", callback, urlencoding::encode(&token))),
        Err(e) => {
            warn!(error = %e, "GitHub sign-in failed");
            let (_, code) = e.status_and_code();
            Redirect::to(&format!("{}#error={}", callback, code))
        }
    };
    ([(header::SET_COOKIE, expired_oauth_nonce_cookie())], redirect).into_response()
}

async fn github_login(
    state: &AppState,
    params: OAuthCallbackQuery,
    browser_nonce: Option<&str>,
) -> Result<String, ApiError> {
    if let Some(error) = params.error {
        return Err(ApiError::Unauthorized(format!("GitHub returned error: {}", error)));
    }
    let code = params
        .code
        .ok_or_else(|| ApiError::BadRequest("No authorization code provided".to_string()))?;
    verify_oauth_state(
        &state.config.jwt_secret,
        params.state.as_deref().unwrap_or_default(),
        browser_nonce,
    )?;

    let github = github_config(state)?;

    let token: GithubTokenResponse = state
        .http
        .post(GITHUB_TOKEN_URL)
        .header("Accept", "application/json")
        .form(&[
            ("client_id", github.client_id.as_str()),
            ("client_secret", github.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", github.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| ApiError::BadGateway(format!("GitHub token exchange failed: {}", e)))?
        .json()
        .await
        .map_err(|e| ApiError::BadGateway(format!("GitHub token response unreadable: {}", e)))?;

    let access_token = token.access_token.ok_or_else(|| {
        ApiError::Unauthorized(
            token
                .error_description
                .unwrap_or_else(|| "GitHub did not issue a token".to_string()),
        )
    })?;

    let user: GithubUser = github_get(state, &access_token, "/user").await?;
    let emails: Vec<GithubEmail> = github_get(state, &access_token, "/user/emails").await?;
    let email = emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
        .ok_or_else(|| ApiError::Unauthorized("GitHub account has no verified primary email".to_string()))?;

    let profile = upsert_oauth_identity(
        state,
        OAuthIdentity {
            provider: "github",
            provider_id: user.id.to_string(),
            email: normalize_email(&email),
            full_name: user.name.or(Some(user.login)),
            avatar_url: user.avatar_url,
        },
    )
    .await?;

    info!(user_id = %profile.id, provider = "github", "User authentication successful via GitHub");
    issue_token(&state.config.jwt_secret, &profile.id)
}

async fn github_get<T: serde::de::DeserializeOwned>(
    state: &AppState,
    access_token: &str,
    path: &str,
) -> Result<T, ApiError> {
    state
        .http
        .get(format!("{}{}", GITHUB_API_URL, path))
        .bearer_auth(access_token)
        .header("User-Agent", "gearswap-api")
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ApiError::BadGateway(format!("GitHub API call failed: {}", e)))?
        .json::<T>()
        .await
        .map_err(|e| ApiError::BadGateway(format!("GitHub API response unreadable: {}", e)))
}

/// GET /api/me
/// Returns the current user's profile, role included
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();
    let profile = ProfileService::new(state.db.clone()).get_profile(&authed.id).await?;
    Ok(Json(profile))
}

/// POST /api/auth/logout
/// Tokens are stateless, so logout is a client-side discard; this only acknowledges it
pub async fn logout_handler(authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!(user_id = %authed.id, "User logout successful");
    Ok(Json(serde_json::json!({
        "message": "Logout successful"
    })))
}
