// src/products/services.rs

use chrono::Utc;
use futures::future::try_join_all;
use sqlx::SqlitePool;
use tracing::{error, info};

use super::models::{Product, ProductFields, ProductRow, ProductStatus};
use crate::common::helpers::string_list_to_json;
use crate::common::{generate_product_id, ApiError};
use crate::services::storage::{is_data_url, PRODUCT_IMAGES_BUCKET};
use crate::services::StorageService;

const PRODUCT_COLUMNS: &str = r#"
    id, user_id, title, description, category, brand, condition, price, currency,
    images, status, tags, created_at, updated_at
"#;

pub struct ProductsService {
    db: SqlitePool,
}

impl ProductsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn fetch(&self, clause: &str, bind: Option<&str>) -> Result<Vec<Product>, ApiError> {
        let sql = format!(
            "SELECT {} FROM products {} ORDER BY created_at DESC, id",
            PRODUCT_COLUMNS, clause
        );
        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// The marketplace set, newest first
    pub async fn list_published(&self) -> Result<Vec<Product>, ApiError> {
        self.fetch("WHERE status = 'published'", None).await
    }

    pub async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Product>, ApiError> {
        self.fetch("WHERE user_id = ?", Some(user_id)).await
    }

    pub async fn list_published_by_owner(&self, user_id: &str) -> Result<Vec<Product>, ApiError> {
        self.fetch("WHERE user_id = ? AND status = 'published'", Some(user_id))
            .await
    }

    /// Every product in any status (admin view)
    pub async fn list_all(&self) -> Result<Vec<Product>, ApiError> {
        self.fetch("", None).await
    }

    pub async fn find_product(&self, id: &str) -> Result<Option<Product>, ApiError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(row.map(Product::from))
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, ApiError> {
        self.find_product(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
    }

    pub async fn create_product(
        &self,
        owner_id: &str,
        fields: &ProductFields,
    ) -> Result<Product, ApiError> {
        let id = generate_product_id();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO products (
                id, user_id, title, description, category, brand, condition, price,
                currency, images, status, tags, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.category.as_str())
        .bind(&fields.brand)
        .bind(fields.condition.as_str())
        .bind(fields.price)
        .bind(&fields.currency)
        .bind(string_list_to_json(&fields.images))
        .bind(fields.status.as_str())
        .bind(string_list_to_json(&fields.tags))
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %owner_id, "Database error creating product");
            ApiError::DatabaseError(e)
        })?;

        info!(product_id = %id, user_id = %owner_id, status = %fields.status, "Product created");
        self.get_product(&id).await
    }

    /// Overwrite every editable column; concurrent writers get last-write-wins
    pub async fn update_product(
        &self,
        id: &str,
        fields: &ProductFields,
    ) -> Result<Product, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET title = ?, description = ?, category = ?, brand = ?, condition = ?,
                price = ?, currency = ?, images = ?, status = ?, tags = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.category.as_str())
        .bind(&fields.brand)
        .bind(fields.condition.as_str())
        .bind(fields.price)
        .bind(&fields.currency)
        .bind(string_list_to_json(&fields.images))
        .bind(fields.status.as_str())
        .bind(string_list_to_json(&fields.tags))
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Product not found".to_string()));
        }

        info!(product_id = %id, "Product updated");
        self.get_product(id).await
    }

    pub async fn set_status(&self, id: &str, status: ProductStatus) -> Result<Product, ApiError> {
        let result = sqlx::query("UPDATE products SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Product not found".to_string()));
        }

        info!(product_id = %id, status = %status, "Product status changed");
        self.get_product(id).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Product not found".to_string()));
        }

        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

/// Upload inline `data:` images concurrently and swap in their URLs, keeping order
///
/// Plain URLs pass through. The first failed upload fails the whole call.
pub async fn resolve_images(
    storage: &StorageService,
    images: &[String],
) -> Result<Vec<String>, ApiError> {
    let uploads = images.iter().map(|image| async move {
        let image = image.trim();
        if is_data_url(image) {
            storage
                .upload_data_url(PRODUCT_IMAGES_BUCKET, image)
                .await
                .map_err(ApiError::from)
        } else {
            Ok(image.to_string())
        }
    });

    try_join_all(uploads).await
}
