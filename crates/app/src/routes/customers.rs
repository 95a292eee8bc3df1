//! Customers proxy route handler.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use showroom_core::Customer;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireShop;
use crate::state::AppState;

use super::{PAGE_SIZE, shopify_session};

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/customers", get(index))
}

/// Customers response body.
#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub customers: Vec<Customer>,
}

/// First page of the shop's customers.
///
/// GET /api/customers
#[instrument(skip(state, session))]
async fn index(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CustomersResponse>, AppError> {
    let api_session = shopify_session(&state, &session, &shop).await?;
    let customers = state.shopify().get_customers(&api_session, PAGE_SIZE).await?;

    Ok(Json(CustomersResponse { customers }))
}
