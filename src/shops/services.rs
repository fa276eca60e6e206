// src/shops/services.rs

use sqlx::SqlitePool;
use tracing::debug;

use super::models::{ShopDetail, ShopSummary};
use crate::common::ApiError;
use crate::products::services::ProductsService;
use crate::profile::services::ProfileService;

pub struct ShopsService {
    db: SqlitePool,
}

impl ShopsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Sellers, plus admins running a shop, ordered by shop name
    pub async fn list_shops(&self) -> Result<Vec<ShopSummary>, ApiError> {
        let shops = sqlx::query_as::<_, ShopSummary>(
            r#"
            SELECT p.id AS seller_id, p.shop_name, p.shop_image,
                   COUNT(pr.id) AS product_count
            FROM profiles p
            LEFT JOIN products pr ON pr.user_id = p.id AND pr.status = 'published'
            WHERE p.role = 'seller'
               OR (p.role = 'admin' AND TRIM(COALESCE(p.shop_name, '')) <> '')
            GROUP BY p.id, p.shop_name, p.shop_image
            ORDER BY COALESCE(p.shop_name, '') COLLATE NOCASE ASC, p.id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(shops)
    }

    pub async fn get_shop(&self, seller_id: &str) -> Result<ShopDetail, ApiError> {
        let not_found = || ApiError::NotFound("Shop not found".to_string());

        let profile = ProfileService::new(self.db.clone())
            .find_profile(seller_id)
            .await?
            .ok_or_else(not_found)?;
        if !profile.has_shop() {
            debug!(user_id = %seller_id, "Shop lookup for a user without a shop");
            return Err(not_found());
        }

        let products = ProductsService::new(self.db.clone())
            .list_published_by_owner(seller_id)
            .await?;

        Ok(ShopDetail {
            seller_id: profile.id,
            shop_name: profile.shop_name.unwrap_or_default(),
            shop_description: profile.shop_description,
            shop_image: profile.shop_image,
            phone: profile.phone,
            whatsapp: profile.whatsapp,
            instagram: profile.instagram,
            products,
        })
    }
}
