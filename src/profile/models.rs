// src/profile/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::auth::models::Role;

// ============================================================================
// Profile Models
// ============================================================================

/// `profiles` row as stored
#[derive(FromRow, Debug, Clone)]
pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub role: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub avatar_url: Option<String>,
    pub shop_name: Option<String>,
    pub shop_description: Option<String>,
    pub shop_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub avatar_url: Option<String>,
    pub shop_name: Option<String>,
    pub shop_description: Option<String>,
    pub shop_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let role = row.role.parse::<Role>().unwrap_or_else(|e| {
            warn!(user_id = %row.id, error = %e, "Unreadable role, treating as buyer");
            Role::Buyer
        });
        Self {
            id: row.id,
            email: row.email,
            role,
            full_name: row.full_name,
            phone: row.phone,
            whatsapp: row.whatsapp,
            instagram: row.instagram,
            avatar_url: row.avatar_url,
            shop_name: row.shop_name,
            shop_description: row.shop_description,
            shop_image: row.shop_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Profile {
    pub fn has_shop(&self) -> bool {
        self.shop_name
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false)
    }
}

// ============================================================================
// Request / Response Models
// ============================================================================

/// Partial profile update; absent fields are left unchanged, empty strings clear
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub shop_name: Option<String>,
    pub shop_description: Option<String>,
    pub shop_image: Option<String>,
}

impl UpdateProfileRequest {
    pub fn touches_shop(&self) -> bool {
        self.shop_name.is_some() || self.shop_description.is_some() || self.shop_image.is_some()
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OpenShopRequest {
    pub shop_name: String,
    pub shop_description: Option<String>,
    /// URL or inline `data:` image
    pub shop_image: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CloseShopResponse {
    pub deleted_products: u64,
    pub profile: Profile,
}

#[derive(Deserialize, Debug, Default)]
pub struct ShopProfileRequest {
    pub prompt: Option<String>,
    pub image: Option<String>,
    pub language: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploadResponse {
    pub avatar_url: String,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}
