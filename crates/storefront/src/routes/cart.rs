//! Cart and checkout handlers.
//!
//! These routes require authentication. Every action redirects with a notice.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::{CartLineId, ProductId};

use crate::db::Store;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CartSummary;
use crate::routes::{PageContext, redirect_with_notice};
use crate::services::cart::{CartError, CartService};
use crate::services::checkout::{CheckoutError, CheckoutService};
use crate::state::AppState;

/// Add-to-cart form data.
///
/// `quantity` is raw text, parsed by [`AddToCartForm::quantity`].
#[derive(Debug, Default, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub quantity: String,
}

impl AddToCartForm {
    /// The requested quantity; blank means one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if the value is not a whole number.
    pub fn quantity(&self) -> Result<i32, CartError> {
        let raw = self.quantity.trim();
        if raw.is_empty() {
            return Ok(1);
        }
        raw.parse().map_err(|_| CartError::InvalidQuantity)
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: CartSummary,
}

/// Display the cart with live prices and the grand total.
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<CartTemplate, AppError> {
    let cart = CartService::new(state.store()).summary(user.id).await?;
    Ok(CartTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        cart,
    })
}

/// Add a product to the cart.
///
/// An unknown product is a 404; validation failures go back to `/` with a
/// notice.
#[instrument(skip_all, fields(user_id = %user.id, %product_id))]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(product_id): Path<ProductId>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let added = match form.quantity() {
        Ok(quantity) => {
            CartService::new(state.store())
                .add(user.id, product_id, quantity)
                .await
        }
        Err(e) => Err(e),
    };
    match added {
        Ok(_) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", &product_id.to_string())]),
            );
            Ok(redirect_with_notice(&session, "/", "Added to cart.").await)
        }
        Err(
            e @ (CartError::NotEnoughStock { .. }
            | CartError::InvalidQuantity
            | CartError::QuantityTooLarge),
        ) => {
            Ok(redirect_with_notice(&session, "/", &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove one of the user's cart lines.
#[instrument(skip_all, fields(user_id = %user.id, %line_id))]
pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(line_id): Path<CartLineId>,
) -> Result<Response, AppError> {
    CartService::new(state.store())
        .remove(user.id, line_id)
        .await?;
    Ok(redirect_with_notice(&session, "/cart", "Removed from cart.").await)
}

/// Check out the whole cart.
///
/// Success goes to the order history. An empty cart or a stock shortfall goes
/// back to the cart with a notice and nothing written.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place_order<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Response, AppError> {
    match CheckoutService::new(state.store())
        .place_order(user.id)
        .await
    {
        Ok(_) => Ok(redirect_with_notice(&session, "/orders", "Order placed.").await),
        Err(e @ (CheckoutError::EmptyCart | CheckoutError::InsufficientStock { .. })) => {
            tracing::info!(reason = %e, "Checkout rejected");
            Ok(redirect_with_notice(&session, "/cart", &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}
