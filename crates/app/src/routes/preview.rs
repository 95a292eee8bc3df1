//! Public catalog previews.
//!
//! No Shopify session is involved: anyone with the link may load a preview.
//! Protected catalogs render only after the credentials were verified for
//! this browser, expired catalogs never render their products.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use showroom_core::{Catalog, CatalogId, PreviewAccess};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::models::CatalogView;
use crate::services::UnlockError;
use crate::services::preview::{access_for, mark_unlocked};
use crate::state::AppState;

/// Build the preview router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/preview/{id}", get(page))
        .route("/preview/{id}/unlock", post(unlock_form))
        .route("/api/preview/{id}", get(state_json))
        .route("/api/preview/{id}/unlock", post(unlock_json))
}

// =============================================================================
// Templates
// =============================================================================

/// Storefront-style catalog page.
#[derive(Template, WebTemplate)]
#[template(path = "preview/catalog.html")]
pub struct CatalogTemplate {
    pub catalog: CatalogView,
}

/// Credential form.
#[derive(Template, WebTemplate)]
#[template(path = "preview/locked.html")]
pub struct LockedTemplate {
    pub id: CatalogId,
    pub title: String,
    pub error: Option<String>,
}

/// Expiry notice.
#[derive(Template, WebTemplate)]
#[template(path = "preview/expired.html")]
pub struct ExpiredTemplate {
    pub title: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "preview/not_found.html")]
pub struct NotFoundTemplate;

// =============================================================================
// Request/Response types
// =============================================================================

/// Submitted preview credentials.
#[derive(Debug, Default, Deserialize)]
pub struct UnlockRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// What a preview visitor may see.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PreviewResponse {
    Expired,
    Locked,
    Unlocked { catalog: CatalogView },
}

async fn find_catalog(state: &AppState, id: &str) -> Result<Option<Catalog>, AppError> {
    let Ok(id) = CatalogId::parse(id) else {
        return Ok(None);
    };
    Ok(state.catalogs().get(id).await?)
}

// =============================================================================
// HTML
// =============================================================================

/// Render a catalog preview.
///
/// GET /preview/{id}
#[instrument(skip(state, session))]
async fn page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(catalog) = find_catalog(&state, &id).await? else {
        return Ok((StatusCode::NOT_FOUND, NotFoundTemplate).into_response());
    };

    let response = match access_for(&session, &catalog, Utc::now()).await? {
        PreviewAccess::Expired => (
            StatusCode::GONE,
            ExpiredTemplate {
                title: catalog.title,
            },
        )
            .into_response(),
        PreviewAccess::Locked => LockedTemplate {
            id: catalog.id,
            title: catalog.title,
            error: None,
        }
        .into_response(),
        PreviewAccess::Unlocked => CatalogTemplate {
            catalog: CatalogView::public(catalog),
        }
        .into_response(),
    };

    Ok(response)
}

/// Check credentials submitted from the preview form.
///
/// POST /preview/{id}/unlock
#[instrument(skip(state, session, form))]
async fn unlock_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<UnlockRequest>,
) -> Result<Response, AppError> {
    let Some(catalog) = find_catalog(&state, &id).await? else {
        return Ok((StatusCode::NOT_FOUND, NotFoundTemplate).into_response());
    };

    let result = state
        .preview_gate()
        .unlock(&catalog, &form.username, &form.password, Utc::now());

    let status = match result {
        Ok(()) => {
            if catalog.is_protected() {
                mark_unlocked(&session, catalog.id).await?;
            }
            return Ok(Redirect::to(&format!("/preview/{}", catalog.id)).into_response());
        }
        Err(UnlockError::Expired) => {
            return Ok((
                StatusCode::GONE,
                ExpiredTemplate {
                    title: catalog.title,
                },
            )
                .into_response());
        }
        Err(UnlockError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
        Err(UnlockError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
    };

    let error = result.err().map(|e| e.to_string());
    Ok((
        status,
        LockedTemplate {
            id: catalog.id,
            title: catalog.title,
            error,
        },
    )
        .into_response())
}

// =============================================================================
// JSON
// =============================================================================

/// Preview state for script clients.
///
/// GET /api/preview/{id}
#[instrument(skip(state, session))]
async fn state_json(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<PreviewResponse>, AppError> {
    let catalog = find_catalog(&state, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("catalog".to_string()))?;

    let response = match access_for(&session, &catalog, Utc::now()).await? {
        PreviewAccess::Expired => PreviewResponse::Expired,
        PreviewAccess::Locked => PreviewResponse::Locked,
        PreviewAccess::Unlocked => PreviewResponse::Unlocked {
            catalog: CatalogView::public(catalog),
        },
    };

    Ok(Json(response))
}

/// Unlock a preview from a script client.
///
/// POST /api/preview/{id}/unlock
#[instrument(skip(state, session, payload))]
async fn unlock_json(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Result<Json<UnlockRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let catalog = find_catalog(&state, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("catalog".to_string()))?;

    state
        .preview_gate()
        .unlock(&catalog, &request.username, &request.password, Utc::now())?;

    if catalog.is_protected() {
        mark_unlocked(&session, catalog.id).await?;
    }

    Ok(Json(PreviewResponse::Unlocked {
        catalog: CatalogView::public(catalog),
    }))
}
