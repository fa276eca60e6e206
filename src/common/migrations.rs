// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Every statement is idempotent. `RESET_DB=true` drops the tables first.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - dropping all tables and recreating schema");
        drop_all_tables(pool).await?;
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_account_tables(pool).await?;
    create_product_tables(pool).await?;
    create_settings_tables(pool).await?;
    create_indexes(pool).await?;

    init_default_settings(pool).await?;

    info!("Database migration completed");
    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for table in ["products", "profiles", "users", "site_settings"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn create_account_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Credentials; password_hash is NULL for OAuth-only accounts
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT,
            provider TEXT NOT NULL DEFAULT 'email',
            provider_id TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'buyer' CHECK (role IN ('admin', 'seller', 'buyer')),
            full_name TEXT,
            phone TEXT,
            whatsapp TEXT,
            instagram TEXT,
            avatar_url TEXT,
            shop_name TEXT,
            shop_description TEXT,
            shop_image TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_product_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // images and tags are JSON string arrays
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL,
            brand TEXT NOT NULL DEFAULT '',
            condition TEXT NOT NULL,
            price REAL NOT NULL CHECK (price >= 0),
            currency TEXT NOT NULL DEFAULT 'EUR',
            images TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'published' CHECK (status IN ('draft', 'published', 'sold')),
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_settings_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS site_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            encrypted INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT DEFAULT (datetime('now')),
            updated_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_products_status ON products(status)",
        "CREATE INDEX IF NOT EXISTS idx_products_user_id ON products(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_profiles_role ON profiles(role)",
    ];
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Seed plain site settings from environment variables, only where no value
/// exists yet. API keys are seeded by `SettingsService::seed_secrets_from_env`
/// so they can be sealed.
async fn init_default_settings(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let seeds = [
        ("site_name", "SITE_NAME"),
        ("site_description", "SITE_DESCRIPTION"),
        ("default_language", "DEFAULT_LANGUAGE"),
        ("ai_provider", "AI_PROVIDER"),
        ("openai_model", "OPENAI_MODEL"),
        ("gemini_model", "GEMINI_MODEL"),
        ("storage_type", "STORAGE_TYPE"),
        ("aws_access_key_id", "AWS_ACCESS_KEY_ID"),
        ("aws_region", "AWS_REGION"),
        ("aws_s3_bucket_name", "AWS_S3_BUCKET_NAME"),
        ("aws_public_base_url", "AWS_PUBLIC_BASE_URL"),
    ];

    for (db_key, env_key) in seeds {
        let Ok(value) = env::var(env_key) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO site_settings (key, value, encrypted, updated_at, updated_by)
            VALUES (?, ?, 0, datetime('now'), 'system')
            "#,
        )
        .bind(db_key)
        .bind(&value)
        .execute(pool)
        .await?;

        if inserted.rows_affected() > 0 {
            info!(key = %db_key, "Initialized setting from environment variable");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'profiles', 'products', 'site_settings') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables.len(), 4);
    }
}
