// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::common::config::AppConfig;
use crate::common::dev_mode::DevModeConfig;
use crate::services::{AIService, SettingsService, StorageService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: Client,
    pub config: Arc<AppConfig>,
    pub dev_mode: DevModeConfig,
    pub settings_service: Arc<SettingsService>,
    pub ai_service: Arc<AIService>,
    pub storage_service: Arc<StorageService>,
}
