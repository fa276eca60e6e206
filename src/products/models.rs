// src/products/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::common::helpers::string_list_from_json;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Cycling,
    Running,
    Swimming,
    Triathlon,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Cycling,
        Category::Running,
        Category::Swimming,
        Category::Triathlon,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cycling => "Cycling",
            Category::Running => "Running",
            Category::Swimming => "Swimming",
            Category::Triathlon => "Triathlon",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category '{}'", s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    New,
    #[serde(rename = "Like-New")]
    LikeNew,
    Good,
    Fair,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::New,
        Condition::LikeNew,
        Condition::Good,
        Condition::Fair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::LikeNew => "Like-New",
            Condition::Good => "Good",
            Condition::Fair => "Fair",
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown condition '{}'", s))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Published,
    Sold,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
            ProductStatus::Sold => "sold",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "published" => Ok(ProductStatus::Published),
            "sold" => Ok(ProductStatus::Sold),
            other => Err(format!("Unknown status '{}'", other)),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Product Models
// ============================================================================

/// `products` row as stored
#[derive(FromRow, Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub condition: String,
    pub price: f64,
    pub currency: String,
    pub images: String,
    pub status: String,
    pub tags: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub user_id: String,
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
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = row.category.parse().unwrap_or_else(|e| {
            warn!(product_id = %row.id, error = %e, "Unreadable category, using Other");
            Category::Other
        });
        let condition = row.condition.parse().unwrap_or_else(|e| {
            warn!(product_id = %row.id, error = %e, "Unreadable condition, using Good");
            Condition::Good
        });
        // Unknown status stays out of the marketplace
        let status = row.status.parse().unwrap_or_else(|e| {
            warn!(product_id = %row.id, error = %e, "Unreadable status, using draft");
            ProductStatus::Draft
        });

        Self {
            images: string_list_from_json(Some(&row.images)),
            tags: string_list_from_json(Some(&row.tags)),
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category,
            brand: row.brand,
            condition,
            price: row.price,
            currency: row.currency,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fully resolved listing fields, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
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

// ============================================================================
// Request / Response Models
// ============================================================================

/// Enum fields arrive as strings so a bad value is a validation error, not a parse failure
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: Option<String>,
    pub condition: String,
    pub price: f64,
    pub currency: Option<String>,
    /// Public URLs or inline `data:` images, in display order
    pub images: Vec<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub condition: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub images: Option<Vec<String>>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct UploadedImagesResponse {
    pub urls: Vec<String>,
}
