//! Checkout against a real PostgreSQL database.
//!
//! Ignored by default. Set `STOCKROOM_TEST_DATABASE_URL` to a disposable
//! database and run with `--include-ignored`.

#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;

use stockroom_core::catalog::ProductDraft;
use stockroom_core::{CategoryId, Price};
use stockroom_integration_tests::PASSWORD;
use stockroom_storefront::db::{self, PgStore};
use stockroom_storefront::models::{Product, User};
use stockroom_storefront::services::auth::AuthService;
use stockroom_storefront::services::cart::CartService;
use stockroom_storefront::services::catalog::CatalogService;
use stockroom_storefront::services::checkout::{CheckoutError, CheckoutService};
use stockroom_storefront::services::orders::OrderHistoryService;

async fn store() -> PgStore {
    let url = std::env::var("STOCKROOM_TEST_DATABASE_URL")
        .expect("STOCKROOM_TEST_DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    db::migrate(&pool).await.unwrap();
    PgStore::new(pool)
}

/// Usernames are unique per run so the database can be reused.
fn unique(prefix: &str) -> String {
    format!("{prefix}{}", Utc::now().timestamp_micros())
}

async fn user(store: &PgStore, prefix: &str) -> User {
    AuthService::new(store)
        .register(&unique(prefix), PASSWORD, "")
        .await
        .unwrap()
}

async fn product(store: &PgStore, category: CategoryId, stock: i32, cents: i64) -> Product {
    let draft = ProductDraft::new(
        &unique("item"),
        stock,
        Price::from_cents(cents).unwrap(),
        category,
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    )
    .unwrap();
    CatalogService::new(store).add_product(&draft).await.unwrap()
}

#[tokio::test]
#[ignore = "requires STOCKROOM_TEST_DATABASE_URL"]
async fn checkout_commits_everything() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let category = CatalogService::new(&store)
        .create_category(&unique("Tools"))
        .await
        .unwrap();
    let widget = product(&store, category.id, 10, 1000).await;
    let gadget = product(&store, category.id, 4, 500).await;

    let cart = CartService::new(&store);
    cart.add(alice.id, widget.id, 2).await.unwrap();
    cart.add(alice.id, gadget.id, 1).await.unwrap();
    let receipt = CheckoutService::new(&store)
        .place_order(alice.id)
        .await
        .unwrap();

    assert_eq!(receipt.total, Decimal::new(2500, 2));
    let catalog = CatalogService::new(&store);
    assert_eq!(catalog.product(widget.id).await.unwrap().quantity, 8);
    assert_eq!(catalog.product(gadget.id).await.unwrap().quantity, 3);
    assert!(cart.summary(alice.id).await.unwrap().is_empty());

    let history = OrderHistoryService::new(&store)
        .history(alice.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].orders.len(), 2);
    assert_eq!(history[0].transaction.total, Decimal::new(2500, 2));
}

#[tokio::test]
#[ignore = "requires STOCKROOM_TEST_DATABASE_URL"]
async fn concurrent_checkouts_never_oversell() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;
    let category = CatalogService::new(&store)
        .create_category(&unique("Garden"))
        .await
        .unwrap();
    let rake = product(&store, category.id, 3, 1250).await;

    let cart = CartService::new(&store);
    cart.add(alice.id, rake.id, 2).await.unwrap();
    cart.add(bob.id, rake.id, 2).await.unwrap();

    let checkout = CheckoutService::new(&store);
    let (a, b) = tokio::join!(checkout.place_order(alice.id), checkout.place_order(bob.id));

    let outcomes = [a, b];
    let placed = outcomes.iter().filter(|r| r.is_ok()).count();
    let short = outcomes
        .iter()
        .filter(|r| matches!(r, Err(CheckoutError::InsufficientStock { .. })))
        .count();
    assert_eq!((placed, short), (1, 1));
    assert_eq!(
        CatalogService::new(&store)
            .product(rake.id)
            .await
            .unwrap()
            .quantity,
        1
    );
}

#[tokio::test]
#[ignore = "requires STOCKROOM_TEST_DATABASE_URL"]
async fn crossed_carts_check_out_without_deadlock() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;
    let category = CatalogService::new(&store)
        .create_category(&unique("Kitchen"))
        .await
        .unwrap();
    let pan = product(&store, category.id, 10, 2000).await;
    let pot = product(&store, category.id, 10, 3000).await;

    // Same products, added in opposite order.
    let cart = CartService::new(&store);
    cart.add(alice.id, pan.id, 1).await.unwrap();
    cart.add(alice.id, pot.id, 1).await.unwrap();
    cart.add(bob.id, pot.id, 1).await.unwrap();
    cart.add(bob.id, pan.id, 1).await.unwrap();

    let checkout = CheckoutService::new(&store);
    let (a, b) = tokio::join!(checkout.place_order(alice.id), checkout.place_order(bob.id));
    a.unwrap();
    b.unwrap();

    let catalog = CatalogService::new(&store);
    assert_eq!(catalog.product(pan.id).await.unwrap().quantity, 8);
    assert_eq!(catalog.product(pot.id).await.unwrap().quantity, 8);
}
