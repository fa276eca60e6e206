// src/services/settings.rs
use crate::common::helpers::{is_masked_secret, mask_secret};
use crate::services::encryption::{EncryptionError, EncryptionService};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub const DEFAULT_SITE_NAME: &str = "GearSwap";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_AI_PROVIDER: &str = "openai";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Secret settings seeded from the environment on startup
pub const SECRET_ENV_SEEDS: [(&str, &str); 3] = [
    ("openai_api_key", "OPENAI_API_KEY"),
    ("gemini_api_key", "GEMINI_API_KEY"),
    ("aws_secret_access_key", "AWS_SECRET_ACCESS_KEY"),
];

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Setting not found: {0}")]
    NotFound(String),

    #[error("Encryption error: {0}")]
    EncryptionError(#[from] EncryptionError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Debug, Clone)]
struct CachedSetting {
    value: String,
    expires_at: DateTime<Utc>,
}

/// The singleton site configuration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: String,
    pub site_logo: String,
    pub default_language: String,
    pub ai_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            site_description: String::new(),
            site_logo: String::new(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            ai_provider: DEFAULT_AI_PROVIDER.to_string(),
            openai_api_key: String::new(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }
}

/// What an anonymous client may read at app start
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSiteSettings {
    pub site_name: String,
    pub site_description: String,
    pub site_logo: String,
    pub default_language: String,
    pub ai_provider: String,
}

impl SiteSettings {
    /// Copy safe to hand to an admin UI: provider keys reduced to head/tail
    pub fn masked(&self) -> Self {
        Self {
            openai_api_key: mask_secret(&self.openai_api_key),
            gemini_api_key: mask_secret(&self.gemini_api_key),
            ..self.clone()
        }
    }

    pub fn public(&self) -> PublicSiteSettings {
        PublicSiteSettings {
            site_name: self.site_name.clone(),
            site_description: self.site_description.clone(),
            site_logo: self.site_logo.clone(),
            default_language: self.default_language.clone(),
            ai_provider: self.ai_provider.clone(),
        }
    }

    /// (storage key, value, secret) for every field, in a stable order
    fn entries(&self) -> [(&'static str, &str, bool); 9] {
        [
            ("site_name", &self.site_name, false),
            ("site_description", &self.site_description, false),
            ("site_logo", &self.site_logo, false),
            ("default_language", &self.default_language, false),
            ("ai_provider", &self.ai_provider, false),
            ("openai_api_key", &self.openai_api_key, true),
            ("openai_model", &self.openai_model, false),
            ("gemini_api_key", &self.gemini_api_key, true),
            ("gemini_model", &self.gemini_model, false),
        ]
    }
}

#[derive(Debug)]
pub struct SettingsService {
    db_pool: SqlitePool,
    cache: Arc<RwLock<HashMap<String, CachedSetting>>>,
    encryption_service: Option<EncryptionService>,
    cache_ttl: Duration,
}

impl SettingsService {
    /// Create a SettingsService, sealing secrets if ENCRYPTION_MASTER_KEY is usable
    pub fn new(db_pool: SqlitePool) -> Self {
        let encryption_service = match EncryptionService::from_env() {
            Ok(service) => {
                info!("Encryption service initialized successfully");
                Some(service)
            }
            Err(e) => {
                warn!(
                    "Encryption service not available: {}. API keys will be stored in plain text.",
                    e
                );
                None
            }
        };

        Self::with_encryption(db_pool, encryption_service)
    }

    pub fn with_encryption(db_pool: SqlitePool, encryption_service: Option<EncryptionService>) -> Self {
        Self {
            db_pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
            encryption_service,
            cache_ttl: Duration::minutes(5),
        }
    }

    /// Get a setting value by key
    /// Falls back to the upper-cased environment variable if the key is not stored
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, SettingsError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(key) {
                if cached.expires_at > Utc::now() {
                    debug!(key = %key, "Setting retrieved from cache");
                    return Ok(Some(cached.value.clone()));
                }
            }
        }

        let row = sqlx::query_as::<_, (String, i64)>(
            "SELECT value, encrypted FROM site_settings WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.db_pool)
        .await?;

        let Some((value, encrypted)) = row else {
            if let Ok(env_value) = env::var(key.to_uppercase()) {
                debug!(key = %key, "Setting retrieved from environment variable");
                return Ok(Some(env_value));
            }
            debug!(key = %key, "Setting not found");
            return Ok(None);
        };

        let plain = if encrypted == 1 {
            self.open(key, &value)?
        } else {
            value
        };

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                key.to_string(),
                CachedSetting {
                    value: plain.clone(),
                    expires_at: Utc::now() + self.cache_ttl,
                },
            );
        }

        debug!(key = %key, "Setting retrieved from database");
        Ok(Some(plain))
    }

    fn open(&self, key: &str, sealed: &str) -> Result<String, SettingsError> {
        match &self.encryption_service {
            Some(service) => service.decrypt(sealed).map_err(|e| {
                error!(key = %key, error = %e, "Failed to decrypt setting");
                SettingsError::EncryptionError(e)
            }),
            None => {
                error!(key = %key, "Setting is encrypted but encryption service not available");
                Err(SettingsError::InvalidConfig(
                    "Encryption service not configured".to_string(),
                ))
            }
        }
    }

    /// Upsert one key
    pub async fn set_setting(
        &self,
        key: &str,
        value: &str,
        encrypt: bool,
        updated_by: Option<&str>,
    ) -> Result<(), SettingsError> {
        let stored_value = if encrypt {
            match &self.encryption_service {
                Some(service) => service.encrypt(value).map_err(|e| {
                    error!(key = %key, error = %e, "Failed to encrypt setting");
                    SettingsError::EncryptionError(e)
                })?,
                None => {
                    return Err(SettingsError::InvalidConfig(
                        "Cannot encrypt setting: encryption service not configured".to_string(),
                    ));
                }
            }
        } else {
            value.to_string()
        };

        sqlx::query(
            r#"
            INSERT INTO site_settings (key, value, encrypted, updated_at, updated_by)
            VALUES (?, ?, ?, datetime('now'), ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                encrypted = excluded.encrypted,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
        )
        .bind(key)
        .bind(&stored_value)
        .bind(if encrypt { 1 } else { 0 })
        .bind(updated_by)
        .execute(&self.db_pool)
        .await?;

        self.invalidate_cache_key(key).await;

        info!(key = %key, encrypted = encrypt, "Setting updated successfully");
        Ok(())
    }

    /// Assemble the typed record, applying defaults for missing or blank keys
    pub async fn load_site_settings(&self) -> Result<SiteSettings, SettingsError> {
        let defaults = SiteSettings::default();

        let site_name = self.get_or("site_name", &defaults.site_name).await?;
        let site_description = self.get_setting("site_description").await?.unwrap_or_default();
        let site_logo = self.get_setting("site_logo").await?.unwrap_or_default();
        let default_language = self
            .get_or("default_language", &defaults.default_language)
            .await?;
        let ai_provider = self
            .get_or("ai_provider", &defaults.ai_provider)
            .await?
            .to_lowercase();
        let openai_api_key = self.get_setting("openai_api_key").await?.unwrap_or_default();
        let openai_model = self.get_or("openai_model", &defaults.openai_model).await?;
        let gemini_api_key = self.get_setting("gemini_api_key").await?.unwrap_or_default();
        let gemini_model = self.get_or("gemini_model", &defaults.gemini_model).await?;

        Ok(SiteSettings {
            site_name,
            site_description,
            site_logo,
            default_language,
            ai_provider,
            openai_api_key,
            openai_model,
            gemini_api_key,
            gemini_model,
        })
    }

    async fn get_or(&self, key: &str, fallback: &str) -> Result<String, SettingsError> {
        Ok(self
            .get_setting(key)
            .await?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string()))
    }

    /// Store API keys from the environment where none is stored yet, sealed
    /// when encryption is available
    pub async fn seed_secrets_from_env(&self) -> Result<(), SettingsError> {
        self.seed_secrets(|name| env::var(name).ok()).await
    }

    pub(crate) async fn seed_secrets<F>(&self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let encrypt = self.is_encryption_available();
        for (key, env_key) in SECRET_ENV_SEEDS {
            let Some(value) = lookup(env_key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };

            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM site_settings WHERE key = ?")
                .bind(key)
                .fetch_one(&self.db_pool)
                .await?;
            if exists > 0 {
                continue;
            }

            if !encrypt {
                warn!(key = %key, "Seeding API key without encryption");
            }
            self.set_setting(key, value.trim(), encrypt, Some("system")).await?;
        }
        Ok(())
    }

    /// Wholesale rewrite of the record
    ///
    /// A blank or masked API key means "keep the stored key".
    pub async fn save_site_settings(
        &self,
        incoming: &SiteSettings,
        updated_by: Option<&str>,
    ) -> Result<SiteSettings, SettingsError> {
        for (key, value, secret) in incoming.entries() {
            let value = value.trim();
            if secret {
                if value.is_empty() || is_masked_secret(value) {
                    debug!(key = %key, "Keeping stored secret");
                    continue;
                }
                if !self.is_encryption_available() {
                    warn!(key = %key, "Storing API key without encryption");
                }
            }
            let encrypt = secret && self.is_encryption_available();
            self.set_setting(key, value, encrypt, updated_by).await?;
        }

        self.invalidate_cache().await;
        self.load_site_settings().await
    }

    /// Get all stored settings (decrypted), skipping sealed ones that cannot be opened
    pub async fn get_all_settings(&self) -> Result<HashMap<String, String>, SettingsError> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT key, value, encrypted FROM site_settings ORDER BY key",
        )
        .fetch_all(&self.db_pool)
        .await?;

        let mut settings = HashMap::new();
        for (key, value, encrypted) in rows {
            let plain = if encrypted == 1 {
                if self.encryption_service.is_none() {
                    warn!(key = %key, "Skipping encrypted setting: encryption service not available");
                    continue;
                }
                self.open(&key, &value)?
            } else {
                value
            };
            settings.insert(key, plain);
        }

        debug!(count = settings.len(), "Retrieved all settings");
        Ok(settings)
    }

    pub async fn invalidate_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        debug!("Settings cache invalidated");
    }

    pub async fn invalidate_cache_key(&self, key: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(key);
    }

    pub fn is_encryption_available(&self) -> bool {
        self.encryption_service.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::memory_pool;

    fn sealed_service(pool: SqlitePool) -> SettingsService {
        let key = EncryptionService::generate_key();
        SettingsService::with_encryption(pool, Some(EncryptionService::from_key(&key).unwrap()))
    }

    #[tokio::test]
    async fn test_set_and_get_setting() {
        let service = SettingsService::with_encryption(memory_pool().await, None);

        service
            .set_setting("site_name", "Trail Market", false, Some("admin"))
            .await
            .unwrap();

        let value = service.get_setting("site_name").await.unwrap();
        assert_eq!(value, Some("Trail Market".to_string()));
    }

    #[tokio::test]
    async fn test_cache_is_invalidated_on_write() {
        let service = SettingsService::with_encryption(memory_pool().await, None);

        service.set_setting("site_logo", "a.png", false, None).await.unwrap();
        assert_eq!(service.get_setting("site_logo").await.unwrap().as_deref(), Some("a.png"));

        service.set_setting("site_logo", "b.png", false, None).await.unwrap();
        assert_eq!(service.get_setting("site_logo").await.unwrap().as_deref(), Some("b.png"));
    }

    #[tokio::test]
    async fn test_secret_is_sealed_at_rest() {
        let pool = memory_pool().await;
        let service = sealed_service(pool.clone());

        let incoming = SiteSettings {
            openai_api_key: "sk-proj-1234567890abcd".to_string(),
            ..SiteSettings::default()
        };
        let saved = service.save_site_settings(&incoming, Some("U_ADMIN001")).await.unwrap();
        assert_eq!(saved.openai_api_key, "sk-proj-1234567890abcd");

        let (raw, encrypted): (String, i64) =
            sqlx::query_as("SELECT value, encrypted FROM site_settings WHERE key = 'openai_api_key'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(encrypted, 1);
        assert_ne!(raw, "sk-proj-1234567890abcd");
    }

    #[tokio::test]
    async fn test_seeded_secrets_are_sealed_and_never_overwrite() {
        let pool = memory_pool().await;
        let service = sealed_service(pool.clone());
        service
            .set_setting("gemini_api_key", "AIzaStoredByAdmin", true, Some("U_ADMIN001"))
            .await
            .unwrap();

        service
            .seed_secrets(|name| match name {
                "OPENAI_API_KEY" => Some("sk-from-env-1234".to_string()),
                "GEMINI_API_KEY" => Some("AIzaFromEnv".to_string()),
                _ => None,
            })
            .await
            .unwrap();

        let (raw, encrypted): (String, i64) =
            sqlx::query_as("SELECT value, encrypted FROM site_settings WHERE key = 'openai_api_key'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(encrypted, 1);
        assert_ne!(raw, "sk-from-env-1234");
        assert_eq!(
            service.get_setting("openai_api_key").await.unwrap().as_deref(),
            Some("sk-from-env-1234")
        );
        assert_eq!(
            service.get_setting("gemini_api_key").await.unwrap().as_deref(),
            Some("AIzaStoredByAdmin")
        );
    }

    #[tokio::test]
    async fn test_wholesale_rewrite_keeps_masked_keys() {
        let service = sealed_service(memory_pool().await);

        let first = SiteSettings {
            site_name: "Old Name".to_string(),
            gemini_api_key: "AIzaSyExampleKey0000".to_string(),
            ..SiteSettings::default()
        };
        let stored = service.save_site_settings(&first, None).await.unwrap();

        // An admin UI sends back what it was shown
        let mut edited = stored.masked();
        edited.site_name = "New Name".to_string();
        edited.ai_provider = "gemini".to_string();

        let saved = service.save_site_settings(&edited, None).await.unwrap();
        assert_eq!(saved.site_name, "New Name");
        assert_eq!(saved.ai_provider, "gemini");
        assert_eq!(saved.gemini_api_key, "AIzaSyExampleKey0000");

        let blanked = SiteSettings {
            gemini_api_key: String::new(),
            ..saved.clone()
        };
        let saved = service.save_site_settings(&blanked, None).await.unwrap();
        assert_eq!(saved.gemini_api_key, "AIzaSyExampleKey0000");
    }

    #[tokio::test]
    async fn test_blank_values_fall_back_to_defaults() {
        let service = SettingsService::with_encryption(memory_pool().await, None);
        service.set_setting("openai_model", "  ", false, None).await.unwrap();
        service.set_setting("ai_provider", "Gemini", false, None).await.unwrap();

        let settings = service.load_site_settings().await.unwrap();
        assert_eq!(settings.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(settings.ai_provider, "gemini");
    }

    #[test]
    fn test_masked_and_public_views() {
        let settings = SiteSettings {
            openai_api_key: "sk-1234567890abcd".to_string(),
            ..SiteSettings::default()
        };
        let masked = settings.masked();
        assert_eq!(masked.openai_api_key, "sk-1…abcd");
        assert_eq!(masked.gemini_api_key, "");

        let public = serde_json::to_value(settings.public()).unwrap();
        assert!(public.get("openaiApiKey").is_none());
        assert_eq!(public["siteName"], DEFAULT_SITE_NAME);
    }

    #[tokio::test]
    async fn test_sealed_value_without_key_is_skipped_in_listing() {
        let pool = memory_pool().await;
        sealed_service(pool.clone())
            .set_setting("gemini_api_key", "AIzaSecret", true, None)
            .await
            .unwrap();

        let plain = SettingsService::with_encryption(pool, None);
        let all = plain.get_all_settings().await.unwrap();
        assert!(!all.contains_key("gemini_api_key"));
    }
}
