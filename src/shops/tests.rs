//! Tests for shops module

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::extract::{Extension, Path};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;

    use crate::auth::models::Role;
    use crate::auth::services::{create_account, NewAccount};
    use crate::common::test_support::{memory_pool, test_state};
    use crate::common::ApiError;
    use crate::products::models::{Category, Condition, ProductFields, ProductStatus};
    use crate::products::services::ProductsService;
    use crate::profile::services::ProfileService;
    use services::ShopsService;

    fn listing(status: ProductStatus) -> ProductFields {
        ProductFields {
            title: "Wetsuit".to_string(),
            description: String::new(),
            category: Category::Triathlon,
            brand: "Orca".to_string(),
            condition: Condition::Fair,
            price: 90.0,
            currency: "EUR".to_string(),
            images: vec!["https://cdn.example/w.jpg".to_string()],
            status,
            tags: vec![],
        }
    }

    async fn user(pool: &sqlx::SqlitePool, email: &str) -> String {
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
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_directory_counts_published_and_orders_by_name() {
        let pool = memory_pool().await;
        let profiles = ProfileService::new(pool.clone());
        let products = ProductsService::new(pool.clone());

        let zed = user(&pool, "zed@example.com").await;
        let alpha = user(&pool, "alpha@example.com").await;
        let admin = user(&pool, "ops@example.com").await;
        let _buyer = user(&pool, "buyer@example.com").await;

        profiles.open_shop(&zed, "Zed Cycles", None, None).await.unwrap();
        profiles.open_shop(&alpha, "alpha tri", None, None).await.unwrap();
        // Admin without a shop stays out of the directory
        profiles.set_role(&admin, Role::Admin).await.unwrap();

        products.create_product(&alpha, &listing(ProductStatus::Published)).await.unwrap();
        products.create_product(&alpha, &listing(ProductStatus::Published)).await.unwrap();
        products.create_product(&alpha, &listing(ProductStatus::Draft)).await.unwrap();
        products.create_product(&zed, &listing(ProductStatus::Sold)).await.unwrap();

        let shops = ShopsService::new(pool.clone()).list_shops().await.unwrap();
        assert_eq!(shops.len(), 2);
        assert_eq!(shops[0].seller_id, alpha);
        assert_eq!(shops[0].product_count, 2);
        assert_eq!(shops[1].seller_id, zed);
        assert_eq!(shops[1].product_count, 0);

        profiles.open_shop(&admin, "House Shop", None, None).await.unwrap();
        let shops = ShopsService::new(pool).list_shops().await.unwrap();
        assert_eq!(shops.len(), 3);
    }

    #[tokio::test]
    async fn test_shop_detail_shows_published_only() {
        let pool = memory_pool().await;
        let profiles = ProfileService::new(pool.clone());
        let products = ProductsService::new(pool.clone());
        let shops = ShopsService::new(pool.clone());

        let seller = user(&pool, "seller@example.com").await;
        profiles
            .open_shop(&seller, "Pool Side", Some("Swim kit"), None)
            .await
            .unwrap();
        products.create_product(&seller, &listing(ProductStatus::Published)).await.unwrap();
        products.create_product(&seller, &listing(ProductStatus::Draft)).await.unwrap();

        let detail = shops.get_shop(&seller).await.unwrap();
        assert_eq!(detail.shop_name, "Pool Side");
        assert_eq!(detail.products.len(), 1);

        let buyer = user(&pool, "buyer@example.com").await;
        assert!(matches!(shops.get_shop(&buyer).await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            shops.get_shop("U_MISSING1").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_handlers_release_state_lock_before_querying() {
        let state = test_state().await;
        let seller = user(&state.db, "seller@example.com").await;
        ProfileService::new(state.db.clone())
            .open_shop(&seller, "Pool Side", None, None)
            .await
            .unwrap();

        let shared = Arc::new(RwLock::new(state));
        let axum::Json(shops) = handlers::list_shops(Extension(shared.clone())).await.unwrap();
        assert_eq!(shops.len(), 1);

        let axum::Json(detail) = handlers::get_shop(Extension(shared.clone()), Path(seller))
            .await
            .unwrap();
        assert_eq!(detail.shop_name, "Pool Side");

        // No guard outlives a handler call
        let writer = tokio::time::timeout(Duration::from_millis(200), shared.write()).await;
        assert!(writer.is_ok());
    }
}
