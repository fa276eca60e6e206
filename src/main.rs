// src/main.rs
use axum::{
    extract::{DefaultBodyLimit, Extension},
    middleware, Router,
};
use dotenv::dotenv;
use reqwest::Client;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod admin;
mod assistant;
mod auth;
mod common;
mod logging_middleware;
mod products;
mod profile;
mod services;
mod shops;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::config::AppConfig;
use common::dev_mode::{apply_cli_override, log_dev_mode_status, DevModeConfig};
use common::AppState;
use services::monitoring::{init_sentry, sentry_event_filter};
use services::{AIService, SettingsService, StorageService};

/// Ten inline images at the per-file limit, base64 inflated, plus the JSON around them
const MAX_REQUEST_BYTES: usize = 150 * 1024 * 1024;

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env();

    // Sentry must be up before the subscriber so its layer sees the client
    let _sentry_guard = init_sentry(config.sentry_dsn.as_deref());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    info!("Loaded {} admin email(s)", config.admin_emails.len());

    // ========================================================================
    // DEV MODE CONFIGURATION
    // ========================================================================

    let dev_mode = apply_cli_override(DevModeConfig::from_env());
    log_dev_mode_status(&dev_mode);

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let http_client = Client::builder().build()?;

    let settings_service = Arc::new(SettingsService::new(pool.clone()));
    settings_service.seed_secrets_from_env().await?;
    info!("SettingsService initialized");

    let ai_service = Arc::new(AIService::new(settings_service.clone()));
    info!("AIService initialized");

    let storage_service = Arc::new(StorageService::new(
        settings_service.clone(),
        config.uploads_dir.clone(),
        config.public_base_url.clone(),
    ));
    storage_service.init_local_dirs().await?;
    info!("StorageService initialized at {}", config.uploads_dir.display());

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let config = Arc::new(config);
    let cors_layer = cors_layer(&config.cors_origins);
    let port = config.port;

    let app_state = AppState {
        db: pool,
        http: http_client,
        config,
        dev_mode,
        settings_service,
        ai_service,
        storage_service,
    };

    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = Router::new()
        // Sign-up, login, OAuth and session
        .merge(auth::auth_routes())
        // Marketplace listings, image uploads and stored files
        .merge(products::products_routes())
        // Profile, avatar and the seller's own shop
        .merge(profile::profile_routes())
        // Public shop directory
        .merge(shops::shops_routes())
        // Chat assistant and listing photo analysis
        .merge(assistant::assistant_routes())
        // Site settings, users and moderation
        .merge(admin::admin_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}
