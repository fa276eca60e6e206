//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT session tokens and OAuth state
//! - Account creation and admin bootstrap
//! - Signup/login handlers
//! - The AuthedUser extractor

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::extract::{Extension, FromRequestParts, Json, Query};
    use axum::http::{header, HeaderMap, HeaderValue, Request};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::common::test_support::{memory_pool, test_config, test_state, TEST_JWT_SECRET};
    use crate::common::config::GithubOAuthConfig;
    use crate::common::{ApiError, AppState};
    use handlers::{
        github_oauth_callback, github_oauth_start, google_identity, login_handler, signup_handler,
    };
    use models::{LoginRequest, OAuthCallbackQuery, SignupRequest};
    use services::{
        bootstrap_admin, create_account, decode_token, issue_token, oauth_nonce_from_headers,
        sign_oauth_state, verify_oauth_state, NewAccount, OAUTH_NONCE_COOKIE,
    };

    #[test]
    fn test_session_token_round_trip() {
        let token = issue_token(TEST_JWT_SECRET, "U_ABC12345").expect("token");
        let claims = decode_token(TEST_JWT_SECRET, &token).expect("claims");
        assert_eq!(claims.sub, "U_ABC12345");

        let seven_days = services::SESSION_DAYS * 24 * 3600;
        let remaining = claims.exp as i64 - chrono::Utc::now().timestamp();
        assert!(remaining > seven_days - 60 && remaining <= seven_days);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = issue_token(TEST_JWT_SECRET, "U_ABC12345").expect("token");
        assert!(matches!(
            decode_token("wrong_secret_key", &token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_oauth_state_is_verified() {
        let (state, nonce) = sign_oauth_state(TEST_JWT_SECRET).expect("state");
        assert!(verify_oauth_state(TEST_JWT_SECRET, &state, Some(&nonce)).is_ok());
        assert!(verify_oauth_state("other", &state, Some(&nonce)).is_err());
        assert!(verify_oauth_state(TEST_JWT_SECRET, "forged", Some(&nonce)).is_err());
    }

    #[test]
    fn test_oauth_state_is_bound_to_browser_nonce() {
        let (state, _) = sign_oauth_state(TEST_JWT_SECRET).expect("state");
        let (_, other_nonce) = sign_oauth_state(TEST_JWT_SECRET).expect("state");

        assert!(verify_oauth_state(TEST_JWT_SECRET, &state, None).is_err());
        assert!(verify_oauth_state(TEST_JWT_SECRET, &state, Some("")).is_err());
        assert!(verify_oauth_state(TEST_JWT_SECRET, &state, Some(&other_nonce)).is_err());
    }

    #[test]
    fn test_nonce_cookie_is_read_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}=N0NCE123; lang=en", OAUTH_NONCE_COOKIE))
                .unwrap(),
        );
        assert_eq!(oauth_nonce_from_headers(&headers).as_deref(), Some("N0NCE123"));
        assert!(oauth_nonce_from_headers(&HeaderMap::new()).is_none());
    }

    async fn github_state() -> Arc<RwLock<AppState>> {
        let mut state = test_state().await;
        let mut config = (*state.config).clone();
        config.github = Some(GithubOAuthConfig {
            client_id: "gh-client".to_string(),
            client_secret: "gh-secret".to_string(),
            redirect_uri: "https://api.gearswap.test/api/auth/github/callback".to_string(),
        });
        state.config = Arc::new(config);
        Arc::new(RwLock::new(state))
    }

    #[tokio::test]
    async fn test_github_start_sets_nonce_cookie() {
        let shared = github_state().await;
        let response = github_oauth_start(Extension(shared)).await.expect("redirect");

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("set-cookie")
            .to_string();
        assert!(cookie.starts_with(&format!("{}=", OAUTH_NONCE_COOKIE)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("location");
        assert!(location.starts_with("https://github.com/login/oauth/authorize"));
        assert!(location.contains("state="));
    }

    #[tokio::test]
    async fn test_github_callback_from_another_browser_is_refused() {
        let shared = github_state().await;
        let (state, _) = sign_oauth_state(TEST_JWT_SECRET).expect("state");

        let response = github_oauth_callback(
            Extension(shared),
            HeaderMap::new(),
            Query(OAuthCallbackQuery {
                code: Some("code-from-attacker".to_string()),
                state: Some(state),
                error: None,
            }),
        )
        .await;

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("location");
        assert!(location.ends_with("/auth/callback#error=UNAUTHORIZED"));
        let cleared = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("set-cookie");
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("moderator".parse::<Role>().is_err());
        assert!(Role::Seller.can_sell());
        assert!(!Role::Buyer.can_sell());
        assert_eq!(serde_json::to_string(&Role::Buyer).unwrap(), "\"buyer\"");
    }

    #[test]
    fn test_google_identity_checks_audience_and_verification() {
        let far_future = (chrono::Utc::now().timestamp() + 3600).to_string();
        let body = serde_json::json!({
            "email": "Rider@Example.com",
            "sub": "1234",
            "email_verified": "true",
            "exp": far_future,
            "aud": "test-client",
            "name": "Rider",
        });

        let identity = google_identity(&body, Some("test-client")).expect("identity");
        assert_eq!(identity.email, "rider@example.com");
        assert_eq!(identity.provider, "google");
        assert_eq!(identity.full_name.as_deref(), Some("Rider"));

        assert!(matches!(
            google_identity(&body, Some("someone-else")),
            Err(ApiError::Unauthorized(_))
        ));

        let mut unverified = body.clone();
        unverified["email_verified"] = serde_json::json!("false");
        assert!(google_identity(&unverified, Some("test-client")).is_err());
    }

    #[tokio::test]
    async fn test_create_account_and_admin_bootstrap() {
        let pool = memory_pool().await;
        let config = test_config(std::env::temp_dir());

        let profile = create_account(
            &pool,
            NewAccount {
                email: " Admin@GearSwap.test ",
                provider: "email",
                full_name: Some("Ops"),
                ..NewAccount::default()
            },
            Role::Buyer,
        )
        .await
        .expect("account");
        assert_eq!(profile.email, "admin@gearswap.test");
        assert_eq!(profile.role, Role::Buyer);

        let promoted = bootstrap_admin(&pool, &config, profile).await.expect("bootstrap");
        assert_eq!(promoted.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let state = Arc::new(RwLock::new(test_state().await));

        let Json(signed_up) = signup_handler(
            Extension(state.clone()),
            Json(SignupRequest {
                email: "rider@example.com".to_string(),
                password: "correct horse".to_string(),
                full_name: Some("Rider".to_string()),
            }),
        )
        .await
        .expect("signup");
        assert_eq!(signed_up.user.role, Role::Buyer);

        let duplicate = signup_handler(
            Extension(state.clone()),
            Json(SignupRequest {
                email: "RIDER@example.com".to_string(),
                password: "another password".to_string(),
                full_name: None,
            }),
        )
        .await;
        assert!(matches!(duplicate, Err(ApiError::BadRequest(_))));

        let Json(logged_in) = login_handler(
            Extension(state.clone()),
            Json(LoginRequest {
                email: "rider@example.com".to_string(),
                password: "correct horse".to_string(),
            }),
        )
        .await
        .expect("login");
        assert_eq!(logged_in.user.id, signed_up.user.id);

        let wrong = login_handler(
            Extension(state),
            Json(LoginRequest {
                email: "rider@example.com".to_string(),
                password: "wrong password".to_string(),
            }),
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let state = Arc::new(RwLock::new(test_state().await));
        let result = signup_handler(
            Extension(state),
            Json(SignupRequest {
                email: "rider@example.com".to_string(),
                password: "short".to_string(),
                full_name: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_extractor_loads_role_from_profile() {
        let app_state = test_state().await;
        let profile = create_account(
            &app_state.db,
            NewAccount {
                email: "seller@example.com",
                provider: "email",
                ..NewAccount::default()
            },
            Role::Seller,
        )
        .await
        .expect("account");
        let token = issue_token(TEST_JWT_SECRET, &profile.id).expect("token");

        let (mut parts, _) = Request::builder()
            .header("Authorization", format!("Bearer {}", token))
            .extension(Arc::new(RwLock::new(app_state.clone())))
            .body(())
            .unwrap()
            .into_parts();
        let authed = AuthedUser::from_request_parts(&mut parts, &()).await.expect("authed");
        assert_eq!(authed.id, profile.id);
        assert_eq!(authed.role, Role::Seller);
        assert!(require_admin(&authed).is_err());

        let (mut anonymous, _) = Request::builder()
            .extension(Arc::new(RwLock::new(app_state)))
            .body(())
            .unwrap()
            .into_parts();
        assert!(matches!(
            AuthedUser::from_request_parts(&mut anonymous, &()).await,
            Err(ApiError::Unauthorized(_))
        ));
    }
}
