// src/common/dev_mode.rs
//! Development mode: bypasses authentication with a fixed local user

use std::env;
use tracing::{info, warn};

use crate::auth::models::Role;

/// Fixed id so listings created in dev mode survive restarts
pub const DEV_USER_ID: &str = "U_DEV00001";

#[derive(Debug, Clone)]
pub struct DevModeConfig {
    pub enabled: bool,
    pub user_email: String,
    pub user_name: String,
    pub user_role: Role,
}

impl DevModeConfig {
    pub fn from_env() -> Self {
        let enabled = env_flag("DEV_MODE");

        let user_role = env::var("DEV_USER_ROLE")
            .ok()
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or(Role::Seller);

        Self {
            enabled,
            user_email: env::var("DEV_USER_EMAIL").unwrap_or_else(|_| "dev@test.com".to_string()),
            user_name: env::var("DEV_USER_NAME").unwrap_or_else(|_| "Dev User".to_string()),
            user_role,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Log dev mode status on startup
pub fn log_dev_mode_status(config: &DevModeConfig) {
    if config.enabled {
        warn!(
            email = %config.user_email,
            role = %config.user_role,
            "DEV MODE ENABLED: authentication bypassed, do not use in production"
        );
    } else {
        info!("Production mode: authentication required");
    }
}

/// `--dev` / `--prod` on the command line override DEV_MODE
pub fn parse_dev_mode_args<I: IntoIterator<Item = String>>(args: I) -> Option<bool> {
    let mut result = None;
    for arg in args {
        match arg.as_str() {
            "--dev" | "--dev-mode" => result = Some(true),
            "--no-dev" | "--prod" | "--production" => result = Some(false),
            _ => {}
        }
    }
    result
}

pub fn apply_cli_override(mut config: DevModeConfig) -> DevModeConfig {
    if let Some(cli_dev_mode) = parse_dev_mode_args(env::args()) {
        info!(dev_mode = cli_dev_mode, "CLI override for DEV_MODE");
        config.enabled = cli_dev_mode;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_override() {
        let args = vec!["api".to_string(), "--dev".to_string()];
        assert_eq!(parse_dev_mode_args(args), Some(true));

        let args = vec!["api".to_string(), "--dev".to_string(), "--prod".to_string()];
        assert_eq!(parse_dev_mode_args(args), Some(false));

        assert_eq!(parse_dev_mode_args(vec!["api".to_string()]), None);
    }
}
