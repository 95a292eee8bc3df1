//! Catalog API route handlers.
//!
//! Every route is scoped to the requesting shop; other shops' catalogs
//! behave as if they did not exist.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use showroom_core::CatalogId;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireShop;
use crate::models::CatalogView;
use crate::services::{CatalogDraft, CatalogService};
use crate::state::AppState;

/// Build the catalog API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalogs", post(create))
        .route("/api/catalogs/list", get(list))
        .route("/api/catalogs/get", get(show))
        .route("/api/catalogs/delete", post(delete))
}

/// Response to a created catalog.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: CatalogId,
}

/// Catalog listing body.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub catalogs: Vec<CatalogView>,
}

/// Query of the single catalog route.
#[derive(Debug, Deserialize)]
pub struct GetQuery {
    pub id: Option<String>,
}

/// Bulk delete request body.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Bulk delete response body.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: Vec<CatalogId>,
}

/// Create a catalog.
///
/// POST /api/catalogs
#[instrument(skip(state, payload))]
async fn create(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
    payload: Result<Json<CatalogDraft>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let Json(draft) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let catalog = CatalogService::new(state.catalogs()).create(&shop, draft).await?;

    Ok(Json(CreatedResponse { id: catalog.id }))
}

/// The shop's catalogs, newest first.
///
/// GET /api/catalogs/list
#[instrument(skip(state))]
async fn list(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
) -> Result<Json<ListResponse>, AppError> {
    let catalogs = CatalogService::new(state.catalogs()).list(&shop).await?;

    Ok(Json(ListResponse {
        catalogs: catalogs.into_iter().map(CatalogView::from).collect(),
    }))
}

/// One of the shop's catalogs.
///
/// GET /api/catalogs/get?id=
#[instrument(skip(state))]
async fn show(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
    Query(query): Query<GetQuery>,
) -> Result<Json<CatalogView>, AppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("id is required".to_string()))?;

    let catalog = CatalogService::new(state.catalogs()).get(&shop, &id).await?;

    Ok(Json(CatalogView::from(catalog)))
}

/// Delete several catalogs at once.
///
/// POST /api/catalogs/delete
#[instrument(skip(state, payload))]
async fn delete(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let deleted = CatalogService::new(state.catalogs())
        .delete_many(&shop, &request.ids)
        .await?;

    Ok(Json(DeleteResponse {
        success: true,
        deleted,
    }))
}
