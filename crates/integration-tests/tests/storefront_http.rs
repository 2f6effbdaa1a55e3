//! End-to-end HTTP flows through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use stockroom_integration_tests::{TestApp, admin, category, customer, product};

#[tokio::test]
async fn health_is_public() {
    let mut app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.get("/health/ready").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let mut app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login() {
    let mut app = TestApp::new();

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/login"));

    let page = app.get("/login").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("You need to login first."));
}

#[tokio::test]
async fn customer_cannot_open_admin_pages() {
    let mut app = TestApp::new();
    customer(&app.store, "alice").await;
    app.login("alice").await;

    let response = app.get("/admin").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let page = app.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("You are not authorized to view this page."));
}

#[tokio::test]
async fn admin_lands_on_dashboard() {
    let mut app = TestApp::new();
    admin(&app.store, "root").await;
    app.login("root").await;

    let response = app.get("/").await;
    assert_eq!(response.location(), Some("/admin"));

    let response = app.get("/admin").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_adds_category_and_product_through_forms() {
    let mut app = TestApp::new();
    admin(&app.store, "root").await;
    app.login("root").await;

    let response = app.post("/category/add", "name=Garden").await;
    assert_eq!(response.location(), Some("/admin"));

    let response = app
        .post(
            "/product/add",
            "name=Rake&quantity=3&price=12.50&category_id=1&manufactured_on=2025-03-01",
        )
        .await;
    assert_eq!(response.location(), Some("/admin"));

    let page = app.get("/category/1/show").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Rake"));
    assert!(page.body.contains("12.50"));
}

#[tokio::test]
async fn invalid_product_form_returns_to_form_with_notice() {
    let mut app = TestApp::new();
    admin(&app.store, "root").await;
    let garden = category(&app.store, "Garden").await;
    app.login("root").await;

    let response = app
        .post(
            "/product/add",
            &format!(
                "name=Rake&quantity=3&price=abc&category_id={}&manufactured_on=2025-03-01",
                garden.id
            ),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location(),
        Some(format!("/product/add?category_id={}", garden.id).as_str())
    );
}

#[tokio::test]
async fn register_shop_and_checkout() {
    let mut app = TestApp::new();
    let tools = category(&app.store, "Tools").await;
    let widget = product(&app.store, tools.id, "Widget", 10, 1000).await;
    let gadget = product(&app.store, tools.id, "Gadget", 4, 500).await;

    let response = app
        .post(
            "/register",
            &format!("username=alice&password={}", stockroom_integration_tests::PASSWORD),
        )
        .await;
    assert_eq!(response.location(), Some("/login"));
    assert!(app.get("/login").await.body.contains("Successfully registered."));

    app.login("alice").await;
    let catalog = app.get("/").await;
    assert_eq!(catalog.status, StatusCode::OK);
    assert!(catalog.body.contains("Widget"));

    let response = app.post(&format!("/cart/{}/add", widget.id), "quantity=2").await;
    assert_eq!(response.location(), Some("/"));
    let response = app.post(&format!("/cart/{}/add", gadget.id), "quantity=1").await;
    assert_eq!(response.location(), Some("/"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("25.00"));

    let response = app.post("/cart/place_order", "").await;
    assert_eq!(response.location(), Some("/orders"));

    let orders = app.get("/orders").await;
    assert_eq!(orders.status, StatusCode::OK);
    assert!(orders.body.contains("Order placed."));
    assert!(orders.body.contains("25.00"));
    assert!(app.get("/cart").await.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn adding_more_than_stock_is_refused() {
    let mut app = TestApp::new();
    let tools = category(&app.store, "Tools").await;
    let gadget = product(&app.store, tools.id, "Gadget", 4, 500).await;
    customer(&app.store, "alice").await;
    app.login("alice").await;

    let response = app.post(&format!("/cart/{}/add", gadget.id), "quantity=5").await;
    assert_eq!(response.location(), Some("/"));
    assert!(app.get("/").await.body.contains("Not enough stock."));
    assert!(app.get("/cart").await.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn malformed_quantity_returns_with_notice() {
    let mut app = TestApp::new();
    let tools = category(&app.store, "Tools").await;
    let gadget = product(&app.store, tools.id, "Gadget", 4, 500).await;
    customer(&app.store, "alice").await;
    app.login("alice").await;

    let response = app.post(&format!("/cart/{}/add", gadget.id), "quantity=abc").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    assert!(app.get("/").await.body.contains("Quantity must be at least 1."));
    assert!(app.get("/cart").await.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn blank_quantity_adds_one() {
    let mut app = TestApp::new();
    let tools = category(&app.store, "Tools").await;
    let gadget = product(&app.store, tools.id, "Gadget", 4, 500).await;
    customer(&app.store, "alice").await;
    app.login("alice").await;

    let response = app.post(&format!("/cart/{}/add", gadget.id), "quantity=").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    assert!(app.get("/").await.body.contains("Added to cart."));
    assert!(app.get("/cart").await.body.contains("5.00"));
}

#[tokio::test]
async fn adding_unknown_product_is_not_found() {
    let mut app = TestApp::new();
    customer(&app.store, "alice").await;
    app.login("alice").await;

    let response = app.post("/cart/999/add", "quantity=1").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn placing_empty_cart_returns_to_cart() {
    let mut app = TestApp::new();
    customer(&app.store, "alice").await;
    app.login("alice").await;

    let response = app.post("/cart/place_order", "").await;
    assert_eq!(response.location(), Some("/cart"));
    assert!(app.get("/cart").await.body.contains("Cart is empty."));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let mut app = TestApp::new();
    customer(&app.store, "alice").await;

    let response = app.post("/login", "username=alice&password=nope-nope-nope").await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(app.get("/").await.location(), Some("/login"));
}

#[tokio::test]
async fn logout_forgets_the_user() {
    let mut app = TestApp::new();
    customer(&app.store, "alice").await;
    app.login("alice").await;

    let response = app.post("/logout", "").await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(app.get("/cart").await.location(), Some("/login"));
}
