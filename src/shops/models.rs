// src/shops/models.rs

use serde::Serialize;
use sqlx::FromRow;

use crate::products::models::Product;

/// One storefront in the shop directory
#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShopSummary {
    pub seller_id: String,
    pub shop_name: Option<String>,
    pub shop_image: Option<String>,
    /// Published listings only
    pub product_count: i64,
}

/// Public storefront: shop fields, contact handles and published listings
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ShopDetail {
    pub seller_id: String,
    pub shop_name: String,
    pub shop_description: Option<String>,
    pub shop_image: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub products: Vec<Product>,
}
