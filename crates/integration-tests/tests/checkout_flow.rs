//! Checkout engine behavior against the in-memory store.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use stockroom_core::catalog::ProductFields;
use stockroom_core::{ProductId, UserId};
use stockroom_integration_tests::{category, customer, product};
use stockroom_storefront::db::{FailPoint, MemoryStore, Store, UnitOfWork};
use stockroom_storefront::models::Product;
use stockroom_storefront::services::cart::CartService;
use stockroom_storefront::services::catalog::CatalogService;
use stockroom_storefront::services::checkout::{CheckoutError, CheckoutService};
use stockroom_storefront::services::orders::OrderHistoryService;

struct Shop {
    store: MemoryStore,
    user: UserId,
    widget: Product,
    gadget: Product,
}

async fn shop() -> Shop {
    let store = MemoryStore::new();
    let user = customer(&store, "alice").await.id;
    let tools = category(&store, "Tools").await;
    let widget = product(&store, tools.id, "Widget", 10, 1000).await;
    let gadget = product(&store, tools.id, "Gadget", 4, 500).await;
    Shop {
        store,
        user,
        widget,
        gadget,
    }
}

async fn stock(store: &MemoryStore, id: ProductId) -> i32 {
    CatalogService::new(store).product(id).await.unwrap().quantity
}

async fn transaction_count(store: &MemoryStore, user: UserId) -> usize {
    let mut uow = store.begin().await.unwrap();
    uow.transactions_for_user(user).await.unwrap().len()
}

#[tokio::test]
async fn checkout_moves_cart_into_one_transaction() {
    let shop = shop().await;
    let cart = CartService::new(&shop.store);
    cart.add(shop.user, shop.widget.id, 2).await.unwrap();
    cart.add(shop.user, shop.gadget.id, 1).await.unwrap();

    let receipt = CheckoutService::new(&shop.store)
        .place_order(shop.user)
        .await
        .unwrap();

    assert_eq!(receipt.total, Decimal::new(2500, 2));
    assert_eq!(receipt.order_count, 2);
    assert_eq!(stock(&shop.store, shop.widget.id).await, 8);
    assert_eq!(stock(&shop.store, shop.gadget.id).await, 3);
    assert!(cart.summary(shop.user).await.unwrap().is_empty());

    let history = OrderHistoryService::new(&shop.store)
        .history(shop.user)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transaction.total, Decimal::new(2500, 2));
    let sum: Decimal = history[0].orders.iter().map(|o| o.line.line_total()).sum();
    assert_eq!(sum, history[0].transaction.total);
}

#[tokio::test]
async fn later_price_change_leaves_order_price_alone() {
    let shop = shop().await;
    CartService::new(&shop.store)
        .add(shop.user, shop.widget.id, 1)
        .await
        .unwrap();
    CheckoutService::new(&shop.store)
        .place_order(shop.user)
        .await
        .unwrap();

    let category_id = shop.widget.category_id.to_string();
    CatalogService::new(&shop.store)
        .update_product(
            shop.widget.id,
            ProductFields {
                name: "Widget",
                quantity: "",
                price: "99.00",
                category_id: &category_id,
                manufactured_on: "2025-01-01",
            },
        )
        .await
        .unwrap();

    let history = OrderHistoryService::new(&shop.store)
        .history(shop.user)
        .await
        .unwrap();
    assert_eq!(history[0].orders[0].line.price.to_string(), "10.00");
    assert_eq!(history[0].transaction.total, Decimal::new(1000, 2));
}

#[tokio::test]
async fn empty_cart_is_rejected_without_writes() {
    let shop = shop().await;

    let err = CheckoutService::new(&shop.store)
        .place_order(shop.user)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(transaction_count(&shop.store, shop.user).await, 0);
    assert_eq!(stock(&shop.store, shop.widget.id).await, 10);
}

async fn assert_rolled_back(point: FailPoint) {
    let shop = shop().await;
    let cart = CartService::new(&shop.store);
    cart.add(shop.user, shop.widget.id, 2).await.unwrap();
    cart.add(shop.user, shop.gadget.id, 1).await.unwrap();
    shop.store.fail_once(point).await;

    let err = CheckoutService::new(&shop.store)
        .place_order(shop.user)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Repository(_)), "{point:?}");
    assert_eq!(stock(&shop.store, shop.widget.id).await, 10);
    assert_eq!(stock(&shop.store, shop.gadget.id).await, 4);
    assert_eq!(cart.summary(shop.user).await.unwrap().entries.len(), 2);
    assert_eq!(transaction_count(&shop.store, shop.user).await, 0);

    // The failure was one-shot; the same cart now goes through.
    let receipt = CheckoutService::new(&shop.store)
        .place_order(shop.user)
        .await
        .unwrap();
    assert_eq!(receipt.total, Decimal::new(2500, 2));
}

#[tokio::test]
async fn failure_writing_order_line_rolls_back() {
    assert_rolled_back(FailPoint::InsertOrderLine).await;
}

#[tokio::test]
async fn failure_at_commit_rolls_back() {
    assert_rolled_back(FailPoint::Commit).await;
}

#[tokio::test]
async fn failure_decrementing_stock_rolls_back() {
    assert_rolled_back(FailPoint::DecrementStock).await;
}

#[tokio::test]
async fn stock_drop_after_add_blocks_checkout() {
    let shop = shop().await;
    let bob = customer(&shop.store, "bob").await.id;
    let cart = CartService::new(&shop.store);
    cart.add(shop.user, shop.widget.id, 1).await.unwrap();
    cart.add(shop.user, shop.gadget.id, 4).await.unwrap();
    cart.add(bob, shop.gadget.id, 1).await.unwrap();
    CheckoutService::new(&shop.store).place_order(bob).await.unwrap();

    let err = CheckoutService::new(&shop.store)
        .place_order(shop.user)
        .await
        .unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            product_id,
            requested,
            available,
            ..
        } => {
            assert_eq!(product_id, shop.gadget.id);
            assert_eq!(requested, 4);
            assert_eq!(available, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Widget line was planned before the failure and must be untouched too.
    assert_eq!(stock(&shop.store, shop.widget.id).await, 10);
    assert_eq!(cart.summary(shop.user).await.unwrap().entries.len(), 2);
    assert_eq!(transaction_count(&shop.store, shop.user).await, 0);
}

#[tokio::test]
async fn history_lists_newest_transaction_first() {
    let shop = shop().await;
    let cart = CartService::new(&shop.store);
    let checkout = CheckoutService::new(&shop.store);

    cart.add(shop.user, shop.widget.id, 1).await.unwrap();
    let first = checkout.place_order(shop.user).await.unwrap();
    cart.add(shop.user, shop.gadget.id, 2).await.unwrap();
    let second = checkout.place_order(shop.user).await.unwrap();

    let history = OrderHistoryService::new(&shop.store)
        .history(shop.user)
        .await
        .unwrap();
    let ids: Vec<_> = history.iter().map(|h| h.transaction.id).collect();
    assert_eq!(ids, vec![second.transaction_id, first.transaction_id]);
    assert_eq!(history[1].orders[0].product_name, "Widget");
}

#[tokio::test]
async fn history_is_scoped_to_the_user() {
    let shop = shop().await;
    let bob = customer(&shop.store, "bob").await.id;
    CartService::new(&shop.store)
        .add(bob, shop.widget.id, 1)
        .await
        .unwrap();
    CheckoutService::new(&shop.store).place_order(bob).await.unwrap();

    let history = OrderHistoryService::new(&shop.store)
        .history(shop.user)
        .await
        .unwrap();
    assert!(history.is_empty());
}
