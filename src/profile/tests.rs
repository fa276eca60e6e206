//! Tests for profile module
//!
//! These tests verify the shop lifecycle:
//! - Opening a shop promotes a buyer to seller
//! - Closing a shop clears shop fields and deletes every listing
//! - Admin role changes to buyer run the same cascade
//! - Profile validators

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::extract::{Extension, Json};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::auth::models::Role;
    use crate::auth::services::{create_account, NewAccount};
    use crate::auth::AuthedUser;
    use crate::common::test_support::{memory_pool, png_data_url, test_state};
    use crate::common::{ApiError, Validator};
    use crate::products::models::{Category, Condition, ProductFields, ProductStatus};
    use crate::products::services::ProductsService;
    use handlers::{profile as profile_handlers, shop};
    use models::{OpenShopRequest, UpdateProfileRequest};
    use services::ProfileService;
    use validators::{ProfileValidator, ShopValidator};

    fn listing(title: &str, status: ProductStatus) -> ProductFields {
        ProductFields {
            title: title.to_string(),
            description: String::new(),
            category: Category::Running,
            brand: "Hoka".to_string(),
            condition: Condition::Good,
            price: 60.0,
            currency: "EUR".to_string(),
            images: vec!["https://cdn.example/shoe.jpg".to_string()],
            status,
            tags: vec![],
        }
    }

    async fn buyer(pool: &sqlx::SqlitePool, email: &str) -> String {
        create_account(
            pool,
            NewAccount {
                email,
                provider: "email",
                ..NewAccount::default()
            },
            Role::Buyer,
        )
        .await
        .expect("account")
        .id
    }

    #[test]
    fn test_shop_validator() {
        let ok = OpenShopRequest {
            shop_name: "Trail Corner".to_string(),
            shop_description: None,
            shop_image: None,
        };
        assert!(ShopValidator.validate(&ok).is_valid);

        let blank = OpenShopRequest {
            shop_name: "   ".to_string(),
            shop_description: None,
            shop_image: None,
        };
        assert!(!ShopValidator.validate(&blank).is_valid);

        let long = OpenShopRequest {
            shop_name: "x".repeat(81),
            shop_description: None,
            shop_image: None,
        };
        assert!(!ShopValidator.validate(&long).is_valid);
    }

    #[test]
    fn test_profile_validator_blocks_blank_shop_rename() {
        let request = UpdateProfileRequest {
            shop_name: Some(String::new()),
            ..UpdateProfileRequest::default()
        };
        assert!(!ProfileValidator.validate(&request).is_valid);
        assert!(request.touches_shop());
        assert!(!UpdateProfileRequest::default().touches_shop());
    }

    #[tokio::test]
    async fn test_open_shop_promotes_buyer_and_admin_keeps_role() {
        let pool = memory_pool().await;
        let profiles = ProfileService::new(pool.clone());

        let id = buyer(&pool, "rider@example.com").await;
        let opened = profiles
            .open_shop(&id, " Trail Corner ", Some("Used running gear"), None)
            .await
            .unwrap();
        assert_eq!(opened.role, Role::Seller);
        assert_eq!(opened.shop_name.as_deref(), Some("Trail Corner"));
        assert!(opened.has_shop());

        let admin_id = buyer(&pool, "ops@example.com").await;
        profiles.set_role(&admin_id, Role::Admin).await.unwrap();
        let admin_shop = profiles
            .open_shop(&admin_id, "House Shop", None, None)
            .await
            .unwrap();
        assert_eq!(admin_shop.role, Role::Admin);
        assert!(admin_shop.has_shop());
    }

    #[tokio::test]
    async fn test_close_shop_cascade_leaves_no_products() {
        let pool = memory_pool().await;
        let profiles = ProfileService::new(pool.clone());
        let products = ProductsService::new(pool.clone());

        let seller = buyer(&pool, "seller@example.com").await;
        let other = buyer(&pool, "other@example.com").await;
        profiles.open_shop(&seller, "Trail Corner", None, None).await.unwrap();
        profiles.open_shop(&other, "Pool Side", None, None).await.unwrap();

        for status in [ProductStatus::Published, ProductStatus::Draft, ProductStatus::Sold] {
            products
                .create_product(&seller, &listing("Trail shoes", status))
                .await
                .unwrap();
        }
        products
            .create_product(&other, &listing("Goggles", ProductStatus::Published))
            .await
            .unwrap();

        let deleted = profiles.close_shop(&seller).await.unwrap();
        assert_eq!(deleted, 3);

        let after = profiles.get_profile(&seller).await.unwrap();
        assert_eq!(after.role, Role::Buyer);
        assert!(after.shop_name.is_none());
        assert!(after.shop_description.is_none());
        assert!(after.shop_image.is_none());
        assert!(products.list_by_owner(&seller).await.unwrap().is_empty());

        // Other shops are untouched
        assert_eq!(products.list_by_owner(&other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_role_change_to_buyer_runs_cascade() {
        let pool = memory_pool().await;
        let profiles = ProfileService::new(pool.clone());
        let products = ProductsService::new(pool.clone());

        let seller = buyer(&pool, "seller@example.com").await;
        profiles.open_shop(&seller, "Trail Corner", None, None).await.unwrap();
        products
            .create_product(&seller, &listing("Trail shoes", ProductStatus::Published))
            .await
            .unwrap();

        let (profile, deleted) = profiles.set_role(&seller, Role::Buyer).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(profile.role, Role::Buyer);
        assert!(!profile.has_shop());
        assert!(products.list_by_owner(&seller).await.unwrap().is_empty());

        // Promotions never delete anything
        let (_, deleted) = profiles.set_role(&seller, Role::Seller).await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_update_profile_merges_and_clears() {
        let pool = memory_pool().await;
        let profiles = ProfileService::new(pool.clone());
        let id = buyer(&pool, "rider@example.com").await;

        profiles
            .update_profile(
                &id,
                &UpdateProfileRequest {
                    full_name: Some("Rider".to_string()),
                    instagram: Some("@rider".to_string()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();

        let updated = profiles
            .update_profile(
                &id,
                &UpdateProfileRequest {
                    instagram: Some("  ".to_string()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Rider"));
        assert!(updated.instagram.is_none());
    }

    #[tokio::test]
    async fn test_buyer_cannot_edit_shop_fields() {
        let state = test_state().await;
        let id = buyer(&state.db, "rider@example.com").await;
        let authed = AuthedUser {
            id,
            email: "rider@example.com".to_string(),
            role: Role::Buyer,
        };

        let result = profile_handlers::update_profile_handler(
            Extension(Arc::new(RwLock::new(state))),
            authed,
            Json(UpdateProfileRequest {
                shop_name: Some("Sneaky Shop".to_string()),
                ..UpdateProfileRequest::default()
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_open_shop_uploads_inline_image() {
        let state = test_state().await;
        let id = buyer(&state.db, "rider@example.com").await;
        let authed = AuthedUser {
            id,
            email: "rider@example.com".to_string(),
            role: Role::Buyer,
        };

        let Json(profile) = shop::open_shop(
            Extension(Arc::new(RwLock::new(state))),
            authed,
            Json(OpenShopRequest {
                shop_name: "Trail Corner".to_string(),
                shop_description: None,
                shop_image: Some(png_data_url()),
            }),
        )
        .await
        .expect("open shop");

        assert_eq!(profile.role, Role::Seller);
        let image = profile.shop_image.expect("shop image");
        assert!(image.starts_with("/api/storage/avatars/"));
    }
}
