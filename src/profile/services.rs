// src/profile/services.rs

use super::models::{Profile, ProfileRow, UpdateProfileRequest};
use crate::auth::models::Role;
use crate::common::ApiError;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

const PROFILE_COLUMNS: &str = r#"
    id, email, role, full_name, phone, whatsapp, instagram, avatar_url,
    shop_name, shop_description, shop_image, created_at, updated_at
"#;

/// Blank strings clear a field
fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn merge(update: &Option<String>, current: Option<String>) -> Option<String> {
    match update {
        Some(value) => normalize(Some(value)),
        None => current,
    }
}

pub struct ProfileService {
    db: SqlitePool,
}

impl ProfileService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, ApiError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE id = ?",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(row.map(Profile::from))
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, ApiError> {
        self.find_profile(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
    }

    /// Every profile, newest first
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC, id",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    /// Apply a partial update and return the stored result
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: &UpdateProfileRequest,
    ) -> Result<Profile, ApiError> {
        let current = self.get_profile(user_id).await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = ?, phone = ?, whatsapp = ?, instagram = ?,
                shop_name = ?, shop_description = ?, shop_image = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(merge(&request.full_name, current.full_name))
        .bind(merge(&request.phone, current.phone))
        .bind(merge(&request.whatsapp, current.whatsapp))
        .bind(merge(&request.instagram, current.instagram))
        .bind(merge(&request.shop_name, current.shop_name))
        .bind(merge(&request.shop_description, current.shop_description))
        .bind(merge(&request.shop_image, current.shop_image))
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        self.get_profile(user_id).await
    }

    pub async fn set_avatar(&self, user_id: &str, avatar_url: Option<&str>) -> Result<(), ApiError> {
        sqlx::query("UPDATE profiles SET avatar_url = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(avatar_url)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    /// Buyer becomes seller; an admin keeps the admin role
    pub async fn open_shop(
        &self,
        user_id: &str,
        shop_name: &str,
        shop_description: Option<&str>,
        shop_image: Option<&str>,
    ) -> Result<Profile, ApiError> {
        let current = self.get_profile(user_id).await?;
        let role = match current.role {
            Role::Admin => Role::Admin,
            Role::Seller | Role::Buyer => Role::Seller,
        };

        sqlx::query(
            r#"
            UPDATE profiles
            SET role = ?, shop_name = ?, shop_description = ?, shop_image = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(role.as_str())
        .bind(shop_name.trim())
        .bind(normalize(shop_description))
        .bind(normalize(shop_image))
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, role = %role, "Shop opened");
        self.get_profile(user_id).await
    }

    /// Close the caller's shop: clear shop fields and delete every listing they own
    ///
    /// Sellers revert to buyer, admins stay admin. Returns the number of
    /// deleted products.
    pub async fn close_shop(&self, user_id: &str) -> Result<u64, ApiError> {
        let current = self.get_profile(user_id).await?;
        let role = match current.role {
            Role::Admin => Role::Admin,
            Role::Seller | Role::Buyer => Role::Buyer,
        };

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;
        let deleted = strip_shop(&mut tx, user_id, role).await?;
        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, deleted_products = deleted, "Shop closed");
        Ok(deleted)
    }

    /// Admin role change; any move to buyer runs the shop cascade in the same transaction
    pub async fn set_role(&self, user_id: &str, new_role: Role) -> Result<(Profile, u64), ApiError> {
        let current = self.get_profile(user_id).await?;

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;
        let deleted = if new_role == Role::Buyer && current.role != Role::Buyer {
            strip_shop(&mut tx, user_id, Role::Buyer).await?
        } else {
            sqlx::query("UPDATE profiles SET role = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(new_role.as_str())
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(ApiError::DatabaseError)?;
            0
        };
        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user_id,
            from = %current.role,
            to = %new_role,
            deleted_products = deleted,
            "Role changed"
        );
        Ok((self.get_profile(user_id).await?, deleted))
    }
}

async fn strip_shop(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    role: Role,
) -> Result<u64, ApiError> {
    let deleted = sqlx::query("DELETE FROM products WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(ApiError::DatabaseError)?
        .rows_affected();

    sqlx::query(
        r#"
        UPDATE profiles
        SET role = ?, shop_name = NULL, shop_description = NULL, shop_image = NULL,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(role.as_str())
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(deleted)
}
