pub mod cache;
pub mod config;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use cache::CacheController;
use search_core::{QueryError, SearchPage, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}
fn default_page() -> i64 { DEFAULT_PAGE }
fn default_page_size() -> i64 { DEFAULT_PAGE_SIZE }

#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Errors visible to `/search` callers. Ingestion failures never show up
/// here; they only shrink the result set.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("{0}")]
    Params(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Params(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { detail: self.to_string() };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cache: CacheController,
}

pub fn build_app(cache: CacheController, cors_allow_origin: Option<&str>) -> Router {
    // Comma-separated origins, or allow Any when unset or unparseable
    let origins: Vec<_> = cors_allow_origin
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    };

    Router::new()
        .route("/search", get(search_handler))
        .with_state(AppState { cache })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchPage>, ApiError> {
    let Query(params) = params?;
    let page = state.cache.search(&params.query, params.page, params.page_size).await?;
    tracing::debug!(query = %params.query, total = page.total, page = page.page, "search served");
    Ok(Json(page))
}
