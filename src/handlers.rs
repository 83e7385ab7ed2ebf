use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::rate_limiter::RateLimiter;
use crate::store::{PaginatedResponse, Product, ProductDraft, Storage};
use crate::validation::{RequestValidator, ValidatedJson};

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Components injected into every handler
pub struct AppState {
    pub storage: Storage,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub env: String,
    pub version: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(storage: Storage, rate_limiter: Arc<dyn RateLimiter>, env: impl Into<String>) -> Self {
        Self {
            storage,
            rate_limiter,
            env: env.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Instant::now(),
        }
    }
}

/// List products with pagination and filters
pub async fn list_products(
    State(state): State<SharedState>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Json<PaginatedResponse>> {
    let params = RequestValidator::query_pairs(raw.as_deref())?;
    let query = RequestValidator::list_query(&params)?;

    let mut response = state.storage.products.list(&query);
    response.next = Some(
        query
            .next_query(&params)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );

    debug!(
        returned = response.data.len(),
        total = response.total,
        page = query.page,
        "listed products"
    );

    Ok(Json(response))
}

pub async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = RequestValidator::parse_id(&id)?;
    Ok(Json(state.storage.products.get(id)?))
}

pub async fn create_product(
    State(state): State<SharedState>,
    ValidatedJson(draft): ValidatedJson<ProductDraft>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.storage.products.create(draft);
    debug!(id = product.id, "created product");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ValidatedJson(draft): ValidatedJson<ProductDraft>,
) -> ApiResult<Json<Product>> {
    let id = RequestValidator::parse_id(&id)?;
    Ok(Json(state.storage.products.update(id, draft)?))
}

pub async fn delete_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = RequestValidator::parse_id(&id)?;
    state.storage.products.delete(id)?;
    debug!(id, "deleted product");
    Ok(StatusCode::NO_CONTENT)
}
