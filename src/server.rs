use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::app::{
    QualityStocksUseCase, RefreshSummary, ScreenedStock, TierListing, DUAL_INDEX_BEST, DUAL_INDEX_EXCELLENT,
};
use crate::constants::SERVICE_NAME;
use crate::domain::{CanonicalInstrument, Tier};
use crate::error::ScreenerError;
use crate::observability::metrics as obs;
use crate::pipeline::processing::screen::TierFilterCriteria;
use crate::pipeline::processing::tiers::dual_index::DualIndexBounds;

type UseCase = Extension<Arc<QualityStocksUseCase>>;

/// Error body is always `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError(ScreenerError);

impl From<ScreenerError> for ApiError {
    fn from(e: ScreenerError) -> Self {
        ApiError(e)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(ScreenerError::InvalidCriteria(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ScreenerError::InvalidCriteria(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ScreenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ScreenerError::InvalidCriteria(_) => StatusCode::BAD_REQUEST,
            ScreenerError::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => error!("Request failed: {}", self.0),
            StatusCode::SERVICE_UNAVAILABLE => warn!("Request failed: {}", self.0),
            _ => debug!("Request rejected: {}", self.0),
        }
        (status, Json(serde_json::json!({ "detail": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn health(Extension(use_case): UseCase) -> impl IntoResponse {
    let snapshot = use_case.snapshot().await;
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "instruments": snapshot.len(),
        "loadedAt": snapshot.loaded_at(),
    }))
}

async fn great(Extension(use_case): UseCase) -> ApiResult<TierListing> {
    obs::api::request("great");
    Ok(Json(use_case.tier(Tier::Great).await?))
}

async fn aggressive(Extension(use_case): UseCase) -> ApiResult<TierListing> {
    obs::api::request("aggressive");
    Ok(Json(use_case.tier(Tier::Aggressive).await?))
}

async fn good(Extension(use_case): UseCase) -> ApiResult<TierListing> {
    obs::api::request("good");
    Ok(Json(use_case.tier(Tier::Good).await?))
}

async fn all(Extension(use_case): UseCase) -> impl IntoResponse {
    obs::api::request("all");
    Json(use_case.all_tiers().await)
}

async fn stock(Extension(use_case): UseCase, Path(code): Path<String>) -> Result<Response, ApiError> {
    obs::api::request("stock");
    let instrument = use_case.stock(&code).await?;
    Ok(Json(instrument.detail()).into_response())
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
    limit: Option<usize>,
}

async fn search(
    Extension(use_case): UseCase,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Vec<CanonicalInstrument>> {
    obs::api::request("search");
    let Query(params) = params?;
    let query = params.query.unwrap_or_default();
    Ok(Json(use_case.search(&query, params.limit).await?))
}

async fn durability_valuation(
    Extension(use_case): UseCase,
    bounds: Result<Query<DualIndexBounds>, QueryRejection>,
) -> ApiResult<TierListing> {
    obs::api::request("durability_valuation");
    let Query(bounds) = bounds?;
    Ok(Json(use_case.dual_index(bounds).await?))
}

async fn durability_valuation_best(Extension(use_case): UseCase) -> impl IntoResponse {
    obs::api::request("durability_valuation_best");
    Json(use_case.dual_index_preset(DUAL_INDEX_BEST).await)
}

async fn durability_valuation_excellent(Extension(use_case): UseCase) -> impl IntoResponse {
    obs::api::request("durability_valuation_excellent");
    Json(use_case.dual_index_preset(DUAL_INDEX_EXCELLENT).await)
}

async fn durability_valuation_stats(Extension(use_case): UseCase) -> impl IntoResponse {
    obs::api::request("durability_valuation_stats");
    Json(use_case.statistics().await)
}

async fn screen(
    Extension(use_case): UseCase,
    criteria: Result<Json<TierFilterCriteria>, JsonRejection>,
) -> ApiResult<TierListing<ScreenedStock>> {
    obs::api::request("screen");
    let Json(criteria) = criteria?;
    Ok(Json(use_case.screen(&criteria).await?))
}

async fn refresh(Extension(use_case): UseCase) -> ApiResult<RefreshSummary> {
    obs::api::request("refresh");
    Ok(Json(use_case.refresh().await?))
}

/// Create the HTTP router with all routes.
pub fn create_server(use_case: Arc<QualityStocksUseCase>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let quality_stocks = Router::new()
        .route("/great", get(great))
        .route("/aggressive", get(aggressive))
        .route("/good", get(good))
        .route("/all", get(all))
        .route("/stock/:code", get(stock))
        .route("/search", get(search))
        .route("/durability-valuation", get(durability_valuation))
        .route("/durability-valuation/best", get(durability_valuation_best))
        .route("/durability-valuation/excellent", get(durability_valuation_excellent))
        .route("/durability-valuation/stats", get(durability_valuation_stats))
        .route("/screen", post(screen))
        .route("/refresh", post(refresh));

    Router::new()
        .route("/health", get(health))
        .nest("/api/quality-stocks", quality_stocks)
        .layer(Extension(use_case))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the given address.
pub async fn start_server(use_case: Arc<QualityStocksUseCase>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_server(use_case);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Tiers: http://{}/api/quality-stocks/all", addr);

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
