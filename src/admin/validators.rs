// src/admin/validators.rs

use super::models::UpdateRoleRequest;
use crate::auth::models::Role;
use crate::common::{ValidationResult, Validator};
use crate::services::ai::AiProvider;
use crate::services::settings::SiteSettings;

const MAX_SITE_NAME_LEN: usize = 80;
const MAX_SITE_DESCRIPTION_LEN: usize = 500;

pub struct SiteSettingsValidator;

impl Validator<SiteSettings> for SiteSettingsValidator {
    fn validate(&self, data: &SiteSettings) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check_text("siteName", &data.site_name, "Site name", MAX_SITE_NAME_LEN);
        result.check_optional_text(
            "siteDescription",
            Some(&data.site_description),
            "Site description",
            MAX_SITE_DESCRIPTION_LEN,
        );

        let language = data.default_language.trim();
        if language.len() < 2 || language.len() > 5 || !language.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            result.add_error("defaultLanguage", "Default language must be a language code such as 'en'");
        }

        if data.ai_provider.parse::<AiProvider>().is_err() {
            result.add_error("aiProvider", "AI provider must be 'openai' or 'gemini'");
        }

        result
    }
}

pub struct RoleValidator;

impl Validator<UpdateRoleRequest> for RoleValidator {
    fn validate(&self, data: &UpdateRoleRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        if data.role.parse::<Role>().is_err() {
            result.add_error("role", "Role must be one of admin, seller, buyer");
        }
        result
    }
}
