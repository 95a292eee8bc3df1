//! Server-rendered admin pages shown inside the Shopify admin.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use showroom_core::{Customer, ProductSnapshot, ShopDomain};
use subtle::ConstantTimeEq;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::db::ShopifySession;
use crate::error::AppError;
use crate::middleware::RequireShop;
use crate::models::CatalogView;
use crate::models::session::keys;
use crate::services::{CatalogDraft, CatalogError, CatalogService};
use crate::state::AppState;

use super::{PAGE_SIZE, admin_url, exit_iframe_url, found, oauth_url, shopify_session};

/// Build the admin pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/catalogs/new", get(new_catalog))
        .route("/admin/catalogs", post(create_catalog))
        .route("/admin/catalogs/delete", post(delete_catalogs))
}

// =============================================================================
// Templates
// =============================================================================

/// Dashboard with products, customers and catalogs.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub shop: String,
    pub products: Vec<ProductSnapshot>,
    pub customers: Vec<Customer>,
    pub catalogs: Vec<CatalogView>,
    pub notice: Option<String>,
    pub form_token: String,
}

/// A product checkbox on the catalog form.
#[derive(Debug, Clone)]
pub struct ProductOption {
    pub product: ProductSnapshot,
    pub selected: bool,
}

/// Catalog creation form.
#[derive(Template, WebTemplate)]
#[template(path = "admin/catalog_new.html")]
pub struct CatalogNewTemplate {
    pub products: Vec<ProductOption>,
    pub title: String,
    pub lead_text: String,
    pub username: String,
    pub expires_at: String,
    pub error: Option<String>,
    pub form_token: String,
}

impl CatalogNewTemplate {
    fn empty(products: Vec<ProductSnapshot>, form_token: String) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|product| ProductOption {
                    product,
                    selected: false,
                })
                .collect(),
            title: String::new(),
            lead_text: String::new(),
            username: String::new(),
            expires_at: String::new(),
            error: None,
            form_token,
        }
    }

    /// Re-render a submitted form with an error. The password is not echoed.
    fn rejected(products: Vec<ProductSnapshot>, form: &FormFields, error: String, form_token: String) -> Self {
        let selected = form.all("product");
        Self {
            products: products
                .into_iter()
                .map(|product| ProductOption {
                    selected: selected.contains(&product.id),
                    product,
                })
                .collect(),
            title: form.first("title").unwrap_or_default().to_string(),
            lead_text: form.first("lead_text").unwrap_or_default().to_string(),
            username: form.first("username").unwrap_or_default().to_string(),
            expires_at: form.first("expires_at").unwrap_or_default().to_string(),
            error: Some(error),
            form_token,
        }
    }
}

// =============================================================================
// Form handling
// =============================================================================

/// Decoded `application/x-www-form-urlencoded` body with repeated fields.
#[derive(Debug, Default)]
struct FormFields(Vec<(String, String)>);

impl FormFields {
    fn parse(body: &[u8]) -> Self {
        Self(url::form_urlencoded::parse(body).into_owned().collect())
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

/// Build a draft from the form, snapshotting the selected products.
fn draft_from_form(form: &FormFields, available: &[ProductSnapshot]) -> Result<CatalogDraft, String> {
    let products = form
        .all("product")
        .iter()
        .map(|id| {
            available
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .ok_or_else(|| format!("unknown product {id}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let expires_at = form
        .first("expires_at")
        .filter(|v| !v.is_empty())
        .map(parse_expiry)
        .transpose()?;

    Ok(CatalogDraft {
        title: form.first("title").map(str::to_string),
        products: Some(products),
        lead_text: form.first("lead_text").map(str::to_string),
        username: form.first("username").map(str::to_string),
        password: form.first("password").map(str::to_string),
        expires_at,
    })
}

/// Parse a `datetime-local` value as UTC.
fn parse_expiry(value: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| "expiry must be a date and time".to_string())
}

/// The browser's form token, created on first use.
async fn form_token(session: &Session) -> Result<String, AppError> {
    if let Some(token) = session.get::<String>(keys::FORM_TOKEN).await? {
        return Ok(token);
    }

    let token = Uuid::new_v4().simple().to_string();
    session.insert(keys::FORM_TOKEN, &token).await?;
    Ok(token)
}

/// Reject form posts that do not echo this browser's token.
async fn check_form_token(session: &Session, submitted: Option<&str>) -> Result<(), AppError> {
    let expected: Option<String> = session.get(keys::FORM_TOKEN).await?;

    let matches = match (expected, submitted) {
        (Some(expected), Some(submitted)) => expected.as_bytes().ct_eq(submitted.as_bytes()).into(),
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "form expired, reload the page and try again".to_string(),
        ))
    }
}

/// Shopify session for admin pages; `Err` carries the re-auth redirect.
async fn admin_session(
    state: &AppState,
    session: &Session,
    shop: &ShopDomain,
) -> Result<Result<ShopifySession, Response>, AppError> {
    match shopify_session(state, session, shop).await {
        Ok(api_session) => Ok(Ok(api_session)),
        Err(AppError::Unauthorized(_)) => {
            tracing::info!(shop = %shop, "No Shopify session for admin page, starting OAuth");
            Ok(Err(found(&exit_iframe_url(&oauth_url(shop, false)))))
        }
        Err(e) => Err(e),
    }
}

/// Shop of an admin page request; `Err` sends a browser without a shop
/// session back through OAuth in the top window instead of a JSON 401.
fn page_shop(
    state: &AppState,
    shop: Result<RequireShop, AppError>,
) -> Result<Result<ShopDomain, Response>, AppError> {
    match shop {
        Ok(RequireShop(shop)) => Ok(Ok(shop)),
        Err(AppError::Unauthorized(reason)) => {
            tracing::info!(%reason, "No shop in browser session for admin page, starting OAuth");
            let store = &state.config().shopify.store;
            Ok(Err(found(&exit_iframe_url(&oauth_url(store, false)))))
        }
        Err(e) => Err(e),
    }
}

async fn back_to_admin(session: &Session, shop: &ShopDomain) -> Result<Response, AppError> {
    let host: Option<String> = session.get(keys::HOST).await?;
    Ok(Redirect::to(&admin_url(shop, host.as_deref())).into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Admin dashboard.
///
/// GET /admin
#[instrument(skip(state, session))]
async fn dashboard(
    shop: Result<RequireShop, AppError>,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let shop = match page_shop(&state, shop)? {
        Ok(shop) => shop,
        Err(redirect) => return Ok(redirect),
    };
    let api_session = match admin_session(&state, &session, &shop).await? {
        Ok(api_session) => api_session,
        Err(redirect) => return Ok(redirect),
    };

    let (products, customers) = tokio::join!(
        state.shopify().get_products(&api_session, PAGE_SIZE),
        state.shopify().get_customers(&api_session, PAGE_SIZE),
    );

    let mut notice = None;
    let products = products.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch products");
        notice = Some("Could not load data from Shopify.".to_string());
        vec![]
    });
    let customers = customers.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch customers");
        notice = Some("Could not load data from Shopify.".to_string());
        vec![]
    });

    let catalogs = CatalogService::new(state.catalogs()).list(&shop).await?;

    Ok(DashboardTemplate {
        shop: shop.into_inner(),
        products,
        customers,
        catalogs: catalogs.into_iter().map(CatalogView::from).collect(),
        notice,
        form_token: form_token(&session).await?,
    }
    .into_response())
}

/// Catalog creation form.
///
/// GET /admin/catalogs/new
#[instrument(skip(state, session))]
async fn new_catalog(
    shop: Result<RequireShop, AppError>,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let shop = match page_shop(&state, shop)? {
        Ok(shop) => shop,
        Err(redirect) => return Ok(redirect),
    };
    let api_session = match admin_session(&state, &session, &shop).await? {
        Ok(api_session) => api_session,
        Err(redirect) => return Ok(redirect),
    };

    let products = state.shopify().get_products(&api_session, PAGE_SIZE).await?;

    Ok(CatalogNewTemplate::empty(products, form_token(&session).await?).into_response())
}

/// Create a catalog from the admin form.
///
/// POST /admin/catalogs
#[instrument(skip(state, session, body))]
async fn create_catalog(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> Result<Response, AppError> {
    let form = FormFields::parse(&body);
    check_form_token(&session, form.first("form_token")).await?;

    let api_session = match admin_session(&state, &session, &shop).await? {
        Ok(api_session) => api_session,
        Err(redirect) => return Ok(redirect),
    };
    let available = state.shopify().get_products(&api_session, PAGE_SIZE).await?;

    let result = match draft_from_form(&form, &available) {
        Ok(draft) => CatalogService::new(state.catalogs()).create(&shop, draft).await,
        Err(message) => Err(CatalogError::Validation(message)),
    };

    match result {
        Ok(_) => back_to_admin(&session, &shop).await,
        Err(CatalogError::Validation(message)) => {
            let token = form_token(&session).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                CatalogNewTemplate::rejected(available, &form, message, token),
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete the catalogs ticked on the dashboard.
///
/// POST /admin/catalogs/delete
#[instrument(skip(state, session, body))]
async fn delete_catalogs(
    RequireShop(shop): RequireShop,
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> Result<Response, AppError> {
    let form = FormFields::parse(&body);
    check_form_token(&session, form.first("form_token")).await?;

    let ids = form.all("id");
    if !ids.is_empty() {
        CatalogService::new(state.catalogs())
            .delete_many(&shop, &ids)
            .await?;
    }

    back_to_admin(&session, &shop).await
}
