// src/common/config.rs
//! Process configuration read from the environment (`.env` is loaded first by main)

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "replace_with_strong_secret";

#[derive(Debug, Clone)]
pub struct GithubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub admin_emails: HashSet<String>,
    pub uploads_dir: PathBuf,
    /// Prefix for locally served storage URLs, empty means relative URLs
    pub public_base_url: String,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    pub google_client_id: Option<String>,
    pub github: Option<GithubOAuthConfig>,
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using an insecure development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let github = match (
            non_empty_var("GITHUB_CLIENT_ID"),
            non_empty_var("GITHUB_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(GithubOAuthConfig {
                client_id,
                client_secret,
                redirect_uri: env::var("GITHUB_REDIRECT_URI").unwrap_or_else(|_| {
                    "http://localhost:8080/api/auth/github/callback".to_string()
                }),
            }),
            _ => None,
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://marketplace.db".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080),
            jwt_secret,
            admin_emails: parse_admin_emails(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            uploads_dir: PathBuf::from(
                env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            ),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173,http://localhost:3000".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            github,
            sentry_dsn: non_empty_var("SENTRY_DSN"),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.contains(&email.trim().to_lowercase())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses the comma-separated ADMIN_EMAILS list, lower-cased
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_emails() {
        let emails = parse_admin_emails(" Admin@Shop.io, ,ops@shop.io ");
        assert_eq!(emails.len(), 2);
        assert!(emails.contains("admin@shop.io"));
        assert!(emails.contains("ops@shop.io"));
    }
}
