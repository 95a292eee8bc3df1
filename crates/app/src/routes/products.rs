//! Products proxy route handler.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use showroom_core::ProductSnapshot;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireShop;
use crate::state::AppState;

use super::{PAGE_SIZE, shopify_session};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/products", get(index))
}

/// Products response body.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductSnapshot>,
}

/// First page of the shop's products.
///
/// GET /api/products
#[instrument(skip(state, session))]
async fn index(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ProductsResponse>, AppError> {
    let api_session = shopify_session(&state, &session, &shop).await?;
    let products = state.shopify().get_products(&api_session, PAGE_SIZE).await?;

    Ok(Json(ProductsResponse { products }))
}
