//! Order history handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;

use crate::db::Store;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::TransactionHistory;
use crate::routes::PageContext;
use crate::services::orders::OrderHistoryService;
use crate::state::AppState;

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub transactions: Vec<TransactionHistory>,
}

/// Display the user's transactions, newest first.
pub async fn index<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<OrdersTemplate, AppError> {
    let transactions = OrderHistoryService::new(state.store())
        .history(user.id)
        .await?;
    Ok(OrdersTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        transactions,
    })
}
