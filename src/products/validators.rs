// src/products/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_IMAGES: usize = 10;
pub const MAX_TAGS: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 5000;
const MAX_BRAND_LEN: usize = 80;
const MAX_TAG_LEN: usize = 40;

pub struct ProductValidator;

impl Validator<CreateProductRequest> for ProductValidator {
    fn validate(&self, data: &CreateProductRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check_text("title", &data.title, "Title", MAX_TITLE_LEN);
        result.check_optional_text(
            "description",
            data.description.as_deref(),
            "Description",
            MAX_DESCRIPTION_LEN,
        );
        result.check_optional_text("brand", data.brand.as_deref(), "Brand", MAX_BRAND_LEN);
        check_category(&mut result, &data.category);
        check_condition(&mut result, &data.condition);
        check_price(&mut result, data.price);
        if let Some(currency) = &data.currency {
            check_currency(&mut result, currency);
        }
        check_images(&mut result, &data.images);
        if let Some(status) = &data.status {
            check_status(&mut result, status);
        }
        if let Some(tags) = &data.tags {
            check_tags(&mut result, tags);
        }

        result
    }
}

impl Validator<UpdateProductRequest> for ProductValidator {
    fn validate(&self, data: &UpdateProductRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(title) = &data.title {
            result.check_text("title", title, "Title", MAX_TITLE_LEN);
        }
        result.check_optional_text(
            "description",
            data.description.as_deref(),
            "Description",
            MAX_DESCRIPTION_LEN,
        );
        result.check_optional_text("brand", data.brand.as_deref(), "Brand", MAX_BRAND_LEN);
        if let Some(category) = &data.category {
            check_category(&mut result, category);
        }
        if let Some(condition) = &data.condition {
            check_condition(&mut result, condition);
        }
        if let Some(price) = data.price {
            check_price(&mut result, price);
        }
        if let Some(currency) = &data.currency {
            check_currency(&mut result, currency);
        }
        // Leaving a listing without photos is not allowed
        if let Some(images) = &data.images {
            check_images(&mut result, images);
        }
        if let Some(status) = &data.status {
            check_status(&mut result, status);
        }
        if let Some(tags) = &data.tags {
            check_tags(&mut result, tags);
        }

        result
    }
}

impl Validator<StatusUpdateRequest> for ProductValidator {
    fn validate(&self, data: &StatusUpdateRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_status(&mut result, &data.status);
        result
    }
}

fn check_category(result: &mut ValidationResult, value: &str) {
    if value.parse::<Category>().is_err() {
        result.add_error(
            "category",
            "Category must be one of Cycling, Running, Swimming, Triathlon, Other",
        );
    }
}

fn check_condition(result: &mut ValidationResult, value: &str) {
    if value.parse::<Condition>().is_err() {
        result.add_error("condition", "Condition must be one of New, Like-New, Good, Fair");
    }
}

fn check_status(result: &mut ValidationResult, value: &str) {
    if value.parse::<ProductStatus>().is_err() {
        result.add_error("status", "Status must be one of draft, published, sold");
    }
}

fn check_price(result: &mut ValidationResult, price: f64) {
    if !price.is_finite() {
        result.add_error("price", "Price must be a number");
    } else if price < 0.0 {
        result.add_error("price", "Price cannot be negative");
    }
}

fn check_currency(result: &mut ValidationResult, currency: &str) {
    let currency = currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        result.add_error("currency", "Currency must be a 3-letter code");
    }
}

fn check_images(result: &mut ValidationResult, images: &[String]) {
    if images.iter().all(|i| i.trim().is_empty()) {
        result.add_error("images", "At least one image is required");
    } else if images.len() > MAX_IMAGES {
        result.add_error("images", "At most 10 images are allowed");
    } else if images.iter().any(|i| i.trim().is_empty()) {
        result.add_error("images", "Image entries cannot be empty");
    }
}

fn check_tags(result: &mut ValidationResult, tags: &[String]) {
    if tags.len() > MAX_TAGS {
        result.add_error("tags", "At most 20 tags are allowed");
    }
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LEN) {
        result.add_error("tags", "Tags must be at most 40 characters");
    }
}

/// Trimmed, non-empty, first occurrence kept
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(tag)) {
            seen.push(tag.to_string());
        }
    }
    seen
}
