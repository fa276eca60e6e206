// src/profile/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub const MAX_SHOP_NAME_LEN: usize = 80;
pub const MAX_SHOP_DESCRIPTION_LEN: usize = 2000;
const MAX_NAME_LEN: usize = 120;
const MAX_CONTACT_LEN: usize = 100;

pub struct ProfileValidator;

impl Validator<UpdateProfileRequest> for ProfileValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check_optional_text("fullName", data.full_name.as_deref(), "Full name", MAX_NAME_LEN);
        result.check_optional_text("phone", data.phone.as_deref(), "Phone", MAX_CONTACT_LEN);
        result.check_optional_text("whatsapp", data.whatsapp.as_deref(), "WhatsApp", MAX_CONTACT_LEN);
        result.check_optional_text("instagram", data.instagram.as_deref(), "Instagram", MAX_CONTACT_LEN);

        // An open shop cannot be renamed to nothing
        if let Some(name) = &data.shop_name {
            result.check_text("shopName", name, "Shop name", MAX_SHOP_NAME_LEN);
        }
        result.check_optional_text(
            "shopDescription",
            data.shop_description.as_deref(),
            "Shop description",
            MAX_SHOP_DESCRIPTION_LEN,
        );

        result
    }
}

pub struct ShopValidator;

impl Validator<OpenShopRequest> for ShopValidator {
    fn validate(&self, data: &OpenShopRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check_text("shopName", &data.shop_name, "Shop name", MAX_SHOP_NAME_LEN);
        result.check_optional_text(
            "shopDescription",
            data.shop_description.as_deref(),
            "Shop description",
            MAX_SHOP_DESCRIPTION_LEN,
        );

        result
    }
}
