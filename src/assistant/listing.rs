// src/assistant/listing.rs
//! Turns a photo analysis into a prefilled create-listing form

use serde::Serialize;
use tracing::{info, warn};

use crate::common::helpers::truncate_chars;
use crate::common::ApiError;
use crate::products::models::{Category, Condition, ProductStatus};
use crate::products::validators::{normalize_tags, MAX_TAGS, MAX_TITLE_LEN};
use crate::services::ai::AIAnalysisResult;

const DEFAULT_CURRENCY: &str = "EUR";

/// Prefilled listing; the seller reviews it and posts it to `/api/products`
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub brand: String,
    pub condition: Condition,
    pub price: f64,
    pub currency: String,
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub tags: Vec<String>,
}

impl ListingDraft {
    /// An unsafe analysis never becomes a draft
    pub fn from_analysis(
        analysis: AIAnalysisResult,
        images: Vec<String>,
    ) -> Result<Self, ApiError> {
        if !analysis.is_safe {
            let reason = analysis
                .safety_reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "The photo does not meet the listing guidelines".to_string());
            warn!(reason = %reason, "Listing photo rejected by moderation");
            return Err(ApiError::ModerationRejected(reason));
        }

        let mut tags = normalize_tags(&analysis.tags);
        tags.truncate(MAX_TAGS);

        let draft = Self {
            title: truncate_chars(analysis.title.trim(), MAX_TITLE_LEN),
            description: analysis.description.trim().to_string(),
            category: category_or_other(&analysis.category),
            brand: analysis.brand.trim().to_string(),
            condition: condition_or_good(&analysis.condition),
            price: clamp_price(analysis.suggested_price),
            currency: DEFAULT_CURRENCY.to_string(),
            images,
            status: ProductStatus::Published,
            tags,
        };

        info!(category = %draft.category, condition = %draft.condition, "Listing draft prepared");
        Ok(draft)
    }
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

pub fn category_or_other(value: &str) -> Category {
    let wanted = squash(value);
    Category::ALL
        .into_iter()
        .find(|c| squash(c.as_str()) == wanted)
        .unwrap_or(Category::Other)
}

/// "Like New", "like-new" and "LIKE_NEW" all mean Like-New
pub fn condition_or_good(value: &str) -> Condition {
    let wanted = squash(value);
    Condition::ALL
        .into_iter()
        .find(|c| squash(c.as_str()) == wanted)
        .unwrap_or(Condition::Good)
}

fn clamp_price(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    }
}
