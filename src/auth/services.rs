//! Account creation, token issuing and OAuth account linking

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use super::models::{Claims, OAuthIdentity, OAuthStateClaims, Role, User};
use crate::common::config::AppConfig;
use crate::common::dev_mode::{DevModeConfig, DEV_USER_ID};
use crate::common::{generate_raw_id, generate_user_id, safe_email_log, ApiError, AppState};
use crate::profile::models::Profile;
use crate::profile::services::ProfileService;
use crate::services::storage::AVATARS_BUCKET;

pub const SESSION_DAYS: i64 = 7;
const OAUTH_STATE_MINUTES: i64 = 10;
pub const OAUTH_NONCE_COOKIE: &str = "gearswap_oauth_nonce";
const OAUTH_COOKIE_PATH: &str = "/api/auth/github";

/// Fields of a new account
#[derive(Debug, Default)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub provider: &'a str,
    pub provider_id: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Role a brand-new account starts with
pub fn initial_role(config: &AppConfig, email: &str) -> Role {
    if config.is_admin_email(email) {
        Role::Admin
    } else {
        Role::Buyer
    }
}

pub fn issue_token(secret: &str, user_id: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::days(SESSION_DAYS)).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!(error = %e, "JWT token validation failed");
        ApiError::Unauthorized("invalid token".into())
    })
}

/// Self-verifying `state` for the OAuth redirect, no server-side session needed
/// Signs a short-lived OAuth `state` and returns it with the nonce it carries.
/// The nonce also goes into a browser cookie so the callback can only be
/// completed by the browser that started the flow.
pub fn sign_oauth_state(secret: &str) -> Result<(String, String), ApiError> {
    let nonce = generate_raw_id(16);
    let claims = OAuthStateClaims {
        nonce: nonce.clone(),
        exp: (Utc::now() + Duration::minutes(OAUTH_STATE_MINUTES)).timestamp() as usize,
    };
    let state = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| ApiError::InternalServer("jwt error".to_string()))?;
    Ok((state, nonce))
}

pub fn verify_oauth_state(
    secret: &str,
    state: &str,
    browser_nonce: Option<&str>,
) -> Result<(), ApiError> {
    let claims = decode::<OAuthStateClaims>(
        state,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        warn!(error = %e, "OAuth state validation failed");
        ApiError::Unauthorized("invalid oauth state".to_string())
    })?
    .claims;

    match browser_nonce {
        Some(nonce) if !nonce.is_empty() && nonce == claims.nonce => Ok(()),
        _ => {
            warn!("OAuth state does not belong to this browser");
            Err(ApiError::Unauthorized("invalid oauth state".to_string()))
        }
    }
}

/// `Set-Cookie` value carrying the OAuth nonce
pub fn oauth_nonce_cookie(nonce: &str, secure: bool) -> String {
    Cookie::build((OAUTH_NONCE_COOKIE, nonce.to_string()))
        .path(OAUTH_COOKIE_PATH)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::minutes(OAUTH_STATE_MINUTES))
        .build()
        .to_string()
}

/// `Set-Cookie` value that removes the OAuth nonce
pub fn expired_oauth_nonce_cookie() -> String {
    Cookie::build((OAUTH_NONCE_COOKIE, ""))
        .path(OAUTH_COOKIE_PATH)
        .http_only(true)
        .max_age(cookie::time::Duration::ZERO)
        .build()
        .to_string()
}

pub fn oauth_nonce_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == OAUTH_NONCE_COOKIE)
        .map(|c| c.value().to_string())
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, provider, provider_id, created_at FROM users WHERE email = ?",
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await
    .map_err(ApiError::DatabaseError)
}

pub async fn find_user_by_provider(
    pool: &SqlitePool,
    provider: &str,
    provider_id: &str,
) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, provider, provider_id, created_at FROM users WHERE provider = ? AND provider_id = ?",
    )
    .bind(provider)
    .bind(provider_id)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::DatabaseError)
}

/// Insert the credential row and its profile in one transaction
pub async fn create_account(
    pool: &SqlitePool,
    account: NewAccount<'_>,
    role: Role,
) -> Result<Profile, ApiError> {
    create_account_with_id(pool, &generate_user_id(), account, role).await
}

async fn create_account_with_id(
    pool: &SqlitePool,
    id: &str,
    account: NewAccount<'_>,
    role: Role,
) -> Result<Profile, ApiError> {
    let email = normalize_email(account.email);

    let mut tx = pool.begin().await.map_err(ApiError::DatabaseError)?;

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, provider, provider_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&email)
    .bind(account.password_hash)
    .bind(account.provider)
    .bind(account.provider_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, email = %safe_email_log(&email), "Database error inserting user");
        ApiError::DatabaseError(e)
    })?;

    sqlx::query(
        "INSERT INTO profiles (id, email, role, full_name, avatar_url) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&email)
    .bind(role.as_str())
    .bind(account.full_name.map(str::trim).filter(|n| !n.is_empty()))
    .bind(account.avatar_url)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::DatabaseError)?;

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %id,
        email = %safe_email_log(&email),
        provider = %account.provider,
        role = %role,
        "New account created"
    );

    ProfileService::new(pool.clone()).get_profile(id).await
}

/// ADMIN_EMAILS is authoritative: a listed account is promoted on sign-in
pub async fn bootstrap_admin(
    pool: &SqlitePool,
    config: &AppConfig,
    profile: Profile,
) -> Result<Profile, ApiError> {
    if profile.role == Role::Admin || !config.is_admin_email(&profile.email) {
        return Ok(profile);
    }

    info!(user_id = %profile.id, "Promoting configured admin email");
    let (profile, _) = ProfileService::new(pool.clone())
        .set_role(&profile.id, Role::Admin)
        .await?;
    Ok(profile)
}

/// Find the account behind an OAuth identity, linking by email or creating one
pub async fn upsert_oauth_identity(
    state: &AppState,
    identity: OAuthIdentity,
) -> Result<Profile, ApiError> {
    let profiles = ProfileService::new(state.db.clone());

    let existing = match find_user_by_provider(&state.db, identity.provider, &identity.provider_id)
        .await?
    {
        Some(user) => Some(user),
        None => find_user_by_email(&state.db, &identity.email).await?,
    };

    let profile = match existing {
        Some(user) => {
            debug!(
                user_id = %user.id,
                provider = %identity.provider,
                "Found existing account for OAuth identity"
            );
            let profile = profiles.get_profile(&user.id).await?;
            if profile.avatar_url.is_none() {
                if let Some(picture) = &identity.avatar_url {
                    let avatar = import_avatar(state, picture).await;
                    profiles.set_avatar(&user.id, Some(&avatar)).await?;
                }
            }
            profiles.get_profile(&user.id).await?
        }
        None => {
            let avatar = match &identity.avatar_url {
                Some(picture) => Some(import_avatar(state, picture).await),
                None => None,
            };
            create_account(
                &state.db,
                NewAccount {
                    email: &identity.email,
                    password_hash: None,
                    provider: identity.provider,
                    provider_id: Some(&identity.provider_id),
                    full_name: identity.full_name.as_deref(),
                    avatar_url: avatar.as_deref(),
                },
                initial_role(&state.config, &identity.email),
            )
            .await?
        }
    };

    bootstrap_admin(&state.db, &state.config, profile).await
}

/// Copy a provider avatar into the avatars bucket, keeping the external URL on failure
async fn import_avatar(state: &AppState, external_url: &str) -> String {
    let download = async {
        let response = state
            .http
            .get(external_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        state
            .storage_service
            .upload(AVATARS_BUCKET, bytes.to_vec(), "")
            .await
            .map_err(|e| e.to_string())
    };

    match download.await {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "Failed to import provider avatar, keeping external URL");
            external_url.to_string()
        }
    }
}

/// Make sure the fixed dev-mode account exists and return its profile
pub async fn ensure_dev_profile(
    pool: &SqlitePool,
    dev_mode: &DevModeConfig,
) -> Result<Profile, ApiError> {
    let profiles = ProfileService::new(pool.clone());
    if let Some(profile) = profiles.find_profile(DEV_USER_ID).await? {
        return Ok(profile);
    }

    let profile = create_account_with_id(
        pool,
        DEV_USER_ID,
        NewAccount {
            email: &dev_mode.user_email,
            provider: "dev",
            full_name: Some(&dev_mode.user_name),
            ..NewAccount::default()
        },
        dev_mode.user_role,
    )
    .await?;

    if dev_mode.user_role == Role::Seller {
        return profiles
            .open_shop(DEV_USER_ID, &format!("{}'s Shop", dev_mode.user_name), None, None)
            .await;
    }
    Ok(profile)
}
