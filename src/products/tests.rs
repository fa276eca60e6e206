//! Tests for products module
//!
//! These tests verify the listing lifecycle:
//! - Validation of create/update requests
//! - Inline image resolution and the all-or-nothing save
//! - Visibility of drafts and sold items
//! - Owner/admin permissions on update, status and delete

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::extract::{Extension, Json, Path, Query};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::auth::models::Role;
    use crate::auth::services::{create_account, NewAccount};
    use crate::auth::AuthedUser;
    use crate::common::test_support::{png_data_url, test_state};
    use crate::common::{ApiError, AppState, Validator};
    use crate::profile::services::ProfileService;
    use handlers::{
        create_product, delete_product, get_product, list_products, update_product,
        update_product_status,
    };
    use services::ProductsService;
    use validators::ProductValidator;

    type SharedState = Extension<Arc<RwLock<AppState>>>;

    async fn account(state: &AppState, email: &str, role: Role) -> AuthedUser {
        let profile = create_account(
            &state.db,
            NewAccount {
                email,
                provider: "email",
                ..NewAccount::default()
            },
            Role::Buyer,
        )
        .await
        .expect("account");
        let profile = if role == Role::Buyer {
            profile
        } else {
            ProfileService::new(state.db.clone())
                .set_role(&profile.id, role)
                .await
                .expect("role")
                .0
        };
        AuthedUser {
            id: profile.id,
            email: profile.email,
            role,
        }
    }

    fn bike_request(images: Vec<String>) -> CreateProductRequest {
        CreateProductRequest {
            title: "Carbon road bike".to_string(),
            description: Some("Size 56, Ultegra".to_string()),
            category: "Cycling".to_string(),
            brand: Some("Canyon".to_string()),
            condition: "Like-New".to_string(),
            price: 1450.0,
            currency: None,
            images,
            status: None,
            tags: Some(vec!["road".to_string(), " Road ".to_string(), "carbon".to_string()]),
        }
    }

    async fn setup() -> (SharedState, AppState, AuthedUser) {
        let state = test_state().await;
        let seller = account(&state, "seller@example.com", Role::Seller).await;
        (Extension(Arc::new(RwLock::new(state.clone()))), state, seller)
    }

    #[test]
    fn test_validator_rejects_bad_listing() {
        let mut request = bike_request(vec![]);
        request.price = -5.0;
        request.category = "Tennis".to_string();
        request.title = "x".repeat(121);

        let result = ProductValidator.validate(&request);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"images"));
        assert!(fields.contains(&"price"));
        assert!(fields.contains(&"category"));
        assert!(fields.contains(&"title"));

        let too_many = bike_request(vec!["https://cdn.example/a.jpg".to_string(); 11]);
        assert!(!ProductValidator.validate(&too_many).is_valid);
    }

    #[test]
    fn test_update_to_zero_images_is_rejected() {
        let request = UpdateProductRequest {
            images: Some(vec![]),
            ..UpdateProductRequest::default()
        };
        assert!(!ProductValidator.validate(&request).is_valid);
        assert!(ProductValidator.validate(&UpdateProductRequest::default()).is_valid);
    }

    #[tokio::test]
    async fn test_create_uploads_inline_images_in_order() {
        let (shared, _, seller) = setup().await;
        let remote = "https://cdn.example/side.jpg".to_string();

        let Json(product) = create_product(
            shared,
            seller.clone(),
            Json(bike_request(vec![png_data_url(), remote.clone()])),
        )
        .await
        .expect("create");

        assert_eq!(product.user_id, seller.id);
        assert_eq!(product.status, ProductStatus::Published);
        assert_eq!(product.currency, "EUR");
        assert_eq!(product.condition, Condition::LikeNew);
        assert_eq!(product.tags, vec!["road".to_string(), "carbon".to_string()]);
        assert_eq!(product.images.len(), 2);
        assert!(product.images[0].starts_with("/api/storage/product-images/"));
        assert!(product.images[0].ends_with(".png"));
        assert_eq!(product.images[1], remote);
    }

    #[tokio::test]
    async fn test_failed_upload_writes_nothing() {
        let (shared, state, seller) = setup().await;

        let result = create_product(
            shared,
            seller.clone(),
            Json(bike_request(vec![
                png_data_url(),
                "data:text/plain;base64,aGVsbG8=".to_string(),
            ])),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let owned = ProductsService::new(state.db.clone())
            .list_by_owner(&seller.id)
            .await
            .unwrap();
        assert!(owned.is_empty());
    }

    #[tokio::test]
    async fn test_buyer_cannot_create() {
        let (shared, state, _) = setup().await;
        let buyer = account(&state, "buyer@example.com", Role::Buyer).await;

        let result = create_product(shared, buyer, Json(bike_request(vec![png_data_url()]))).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_draft_visible_only_to_owner_and_admin() {
        let (shared, state, seller) = setup().await;
        let buyer = account(&state, "buyer@example.com", Role::Buyer).await;
        let admin = account(&state, "ops@example.com", Role::Admin).await;

        let mut request = bike_request(vec!["https://cdn.example/a.jpg".to_string()]);
        request.status = Some("draft".to_string());
        let Json(draft) = create_product(shared.clone(), seller.clone(), Json(request))
            .await
            .unwrap();

        let anonymous = get_product(shared.clone(), Path(draft.id.clone()), None).await;
        assert!(matches!(anonymous, Err(ApiError::NotFound(_))));
        let stranger = get_product(shared.clone(), Path(draft.id.clone()), Some(buyer)).await;
        assert!(matches!(stranger, Err(ApiError::NotFound(_))));

        assert!(get_product(shared.clone(), Path(draft.id.clone()), Some(seller))
            .await
            .is_ok());
        assert!(get_product(shared, Path(draft.id), Some(admin)).await.is_ok());
    }

    #[tokio::test]
    async fn test_marketplace_lists_published_only() {
        let (shared, _, seller) = setup().await;

        let mut draft = bike_request(vec!["https://cdn.example/a.jpg".to_string()]);
        draft.status = Some("draft".to_string());
        create_product(shared.clone(), seller.clone(), Json(draft)).await.unwrap();

        let mut shoes = bike_request(vec!["https://cdn.example/b.jpg".to_string()]);
        shoes.title = "Trail shoes".to_string();
        shoes.category = "Running".to_string();
        shoes.brand = Some("Salomon".to_string());
        create_product(shared.clone(), seller.clone(), Json(shoes)).await.unwrap();

        let Json(all) = list_products(shared.clone(), Query(ProductListQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.total, 1);
        assert_eq!(all.products[0].title, "Trail shoes");
        assert!(all.message.is_none());

        let Json(none) = list_products(
            shared,
            Query(ProductListQuery {
                q: Some("canyon".to_string()),
                category: Some("All".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(none.total, 0);
        assert!(none.message.is_some());
    }

    #[tokio::test]
    async fn test_partial_update_and_permissions() {
        let (shared, state, seller) = setup().await;
        let other = account(&state, "other@example.com", Role::Seller).await;
        let admin = account(&state, "ops@example.com", Role::Admin).await;

        let Json(product) = create_product(
            shared.clone(),
            seller.clone(),
            Json(bike_request(vec!["https://cdn.example/a.jpg".to_string()])),
        )
        .await
        .unwrap();

        let change = UpdateProductRequest {
            price: Some(1200.0),
            ..UpdateProductRequest::default()
        };
        let denied = update_product(
            shared.clone(),
            other.clone(),
            Path(product.id.clone()),
            Json(change.clone()),
        )
        .await;
        assert!(matches!(denied, Err(ApiError::Forbidden(_))));

        let Json(updated) = update_product(shared.clone(), seller, Path(product.id.clone()), Json(change))
            .await
            .unwrap();
        assert_eq!(updated.price, 1200.0);
        assert_eq!(updated.title, product.title);
        assert_eq!(updated.images, product.images);

        let Json(sold) = update_product_status(
            shared.clone(),
            admin.clone(),
            Path(product.id.clone()),
            Json(StatusUpdateRequest {
                status: "sold".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(sold.status, ProductStatus::Sold);

        // Unconstrained: sold can go back to draft
        let Json(back) = update_product_status(
            shared.clone(),
            admin.clone(),
            Path(product.id.clone()),
            Json(StatusUpdateRequest {
                status: "draft".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(back.status, ProductStatus::Draft);

        assert!(delete_product(shared.clone(), other, Path(product.id.clone()))
            .await
            .is_err());
        delete_product(shared.clone(), admin.clone(), Path(product.id.clone()))
            .await
            .expect("admin delete");
        assert!(matches!(
            delete_product(shared, admin, Path(product.id)).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
