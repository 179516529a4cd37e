//! Checkout workflow properties, driven directly against the repositories
//! and the transaction in `tandir_server::checkout`.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, NaiveTime, Utc};

use tandir_core::{ChatId, DeliveryType, Money, PaymentType};
use tandir_integration_tests::{
    make_unavailable, seed_branch, seed_category, seed_product, seed_user, server_pool,
};
use tandir_server::checkout::{self, CheckoutError, CheckoutRequest};
use tandir_server::db::CartRepository;

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap()
}

fn pickup_request(branch: tandir_core::BranchId) -> CheckoutRequest {
    CheckoutRequest {
        delivery_type: DeliveryType::Pickup,
        address: None,
        latitude: None,
        longitude: None,
        payment_type: PaymentType::Cash,
        notes: None,
        pickup_branch_id: Some(branch),
    }
}

#[tokio::test]
async fn cart_total_tracks_adds_sets_and_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let a = seed_product(&pool, category, "Lavash classic", 10_000).await;
    let b = seed_product(&pool, category, "Cola", 5_000).await;

    let carts = CartRepository::new(&pool);

    // Adding the same product twice merges into one line.
    carts.add_item(user, a, 1).await.unwrap();
    let cart = carts.add_item(user, a, 1).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total_price(), Money::from_som(20_000));

    let cart = carts.add_item(user, b, 1).await.unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_price(), Money::from_som(25_000));

    let item_b = cart
        .items
        .iter()
        .find(|i| i.product_id == b)
        .unwrap()
        .id;
    let cart = carts.set_quantity(user, item_b, 3).await.unwrap();
    assert_eq!(cart.total_price(), Money::from_som(35_000));

    let cart = carts.delete_item(user, item_b).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_price(), Money::from_som(20_000));
}

#[tokio::test]
async fn cart_ownership_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let alice = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let bob = seed_user(&pool, ChatId::new(2), "+998901110002").await;
    let category = seed_category(&pool, "Lavash").await;
    let product = seed_product(&pool, category, "Lavash classic", 10_000).await;

    let carts = CartRepository::new(&pool);
    let cart = carts.add_item(alice, product, 1).await.unwrap();
    let item = cart.items[0].id;

    // Bob cannot touch Alice's line; the error does not reveal it exists.
    let err = carts.set_quantity(bob, item, 5).await.unwrap_err();
    assert!(matches!(
        err,
        tandir_server::db::RepositoryError::NotFound
    ));
    let err = carts.delete_item(bob, item).await.unwrap_err();
    assert!(matches!(
        err,
        tandir_server::db::RepositoryError::NotFound
    ));

    let cart = carts.view(alice).await.unwrap();
    assert_eq!(cart.items[0].quantity, 1);
}

#[tokio::test]
async fn pickup_checkout_freezes_prices_and_computes_estimates() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let a = seed_product(&pool, category, "Lavash classic", 10_000).await;
    let b = seed_product(&pool, category, "Cola", 5_000).await;
    let branch = seed_branch(&pool, "Chilonzor", 20).await;

    let carts = CartRepository::new(&pool);
    carts.add_item(user, a, 2).await.unwrap();
    carts.add_item(user, b, 1).await.unwrap();

    let before = Utc::now();
    let order = checkout::run(&pool, user, pickup_request(branch), noon())
        .await
        .unwrap();

    assert_eq!(order.total_price, Money::from_som(25_000));
    assert_eq!(order.items.len(), 2);

    let line_a = order.items.iter().find(|i| i.product_name == "Lavash classic").unwrap();
    assert_eq!(line_a.price_per_unit, Money::from_som(10_000));
    assert_eq!(line_a.quantity, 2);
    assert_eq!(line_a.line_total, Money::from_som(20_000));

    // ready_at = now + 20 minutes; pickup orders get no delivery estimate.
    let ready_at = order.estimated_ready_at.unwrap();
    let expected = before + Duration::minutes(20);
    assert!((ready_at - expected).num_seconds().abs() < 60);
    assert!(order.estimated_delivery_at.is_none());

    // The cart is drained, and a second attempt finds it empty.
    let cart = carts.view(user).await.unwrap();
    assert!(cart.items.is_empty());

    let err = checkout::run(&pool, user, pickup_request(branch), noon())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(detail) if detail == "cart is empty"));
}

#[tokio::test]
async fn later_price_changes_do_not_touch_past_orders() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let product = seed_product(&pool, category, "Lavash classic", 10_000).await;
    let branch = seed_branch(&pool, "Chilonzor", 20).await;

    CartRepository::new(&pool)
        .add_item(user, product, 1)
        .await
        .unwrap();
    let order = checkout::run(&pool, user, pickup_request(branch), noon())
        .await
        .unwrap();

    sqlx::query("UPDATE products SET price = 99000 WHERE id = ?")
        .bind(product.as_i64())
        .execute(&pool)
        .await
        .unwrap();

    let reloaded = tandir_server::db::OrderRepository::new(&pool)
        .get(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.total_price, Money::from_som(10_000));
    assert_eq!(reloaded.items[0].price_per_unit, Money::from_som(10_000));
}

#[tokio::test]
async fn unavailable_product_aborts_whole_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let a = seed_product(&pool, category, "Lavash classic", 10_000).await;
    let b = seed_product(&pool, category, "Cola", 5_000).await;
    let branch = seed_branch(&pool, "Chilonzor", 20).await;

    let carts = CartRepository::new(&pool);
    carts.add_item(user, a, 2).await.unwrap();
    carts.add_item(user, b, 1).await.unwrap();
    make_unavailable(&pool, b).await;

    let err = checkout::run(&pool, user, pickup_request(branch), noon())
        .await
        .unwrap_err();
    match err {
        CheckoutError::Validation(detail) => assert!(detail.contains("Cola"), "{detail}"),
        other => panic!("expected validation error, got {other:?}"),
    }

    // No order or order-item rows, and the cart keeps all its lines.
    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    let (items,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((orders, items), (0, 0));

    let cart = carts.view(user).await.unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_price(), Money::from_som(25_000));
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let branch = seed_branch(&pool, "Chilonzor", 20).await;

    let err = checkout::run(&pool, user, pickup_request(branch), noon())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(detail) if detail == "cart is empty"));
}

#[tokio::test]
async fn delivery_requires_address_or_complete_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let product = seed_product(&pool, category, "Lavash classic", 10_000).await;

    let carts = CartRepository::new(&pool);
    carts.add_item(user, product, 1).await.unwrap();

    let request = |address: Option<&str>, lat: Option<f64>, lon: Option<f64>| CheckoutRequest {
        delivery_type: DeliveryType::Delivery,
        address: address.map(ToOwned::to_owned),
        latitude: lat,
        longitude: lon,
        payment_type: PaymentType::Card,
        notes: None,
        pickup_branch_id: None,
    };

    // Lone coordinate: rejected, cart untouched.
    let err = checkout::run(&pool, user, request(None, Some(41.3), None), noon())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));

    // Neither address nor coordinates: rejected.
    let err = checkout::run(&pool, user, request(None, None, None), noon())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));

    assert_eq!(carts.view(user).await.unwrap().items.len(), 1);

    // A complete pair is enough; no branch resolves for delivery, so the
    // estimates stay unset.
    let order = checkout::run(&pool, user, request(None, Some(41.3), Some(69.2)), noon())
        .await
        .unwrap();
    assert_eq!(order.delivery_type, DeliveryType::Delivery);
    assert!(order.estimated_ready_at.is_none());
    assert!(order.estimated_delivery_at.is_none());
}

#[tokio::test]
async fn closed_branch_fails_checkout_at_commit_time() {
    let dir = tempfile::tempdir().unwrap();
    let pool = server_pool(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let product = seed_product(&pool, category, "Lavash classic", 10_000).await;
    let branch = seed_branch(&pool, "Chilonzor", 20).await;

    // The branch closes before the submission's wall-clock time.
    sqlx::query("UPDATE branches SET opens_at = '09:00:00', closes_at = '11:00:00' WHERE id = ?")
        .bind(branch.as_i64())
        .execute(&pool)
        .await
        .unwrap();

    let carts = CartRepository::new(&pool);
    carts.add_item(user, product, 1).await.unwrap();

    let err = checkout::run(&pool, user, pickup_request(branch), noon())
        .await
        .unwrap_err();
    match err {
        CheckoutError::Validation(detail) => assert!(detail.contains("closed"), "{detail}"),
        other => panic!("expected validation error, got {other:?}"),
    }

    assert_eq!(carts.view(user).await.unwrap().items.len(), 1);
}
