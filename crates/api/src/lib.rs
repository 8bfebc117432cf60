mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Json, Path, Query, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use wayfare_agents::{ItineraryPlanner, ModificationOutcome, PlannerError};
use wayfare_core::{parse_categories, BudgetError, Itinerary, TripChanges, TripParameters};
use wayfare_observability::{AppMetrics, MetricsSnapshot};
use wayfare_places::DemoCatalog;
use wayfare_storage::Store;

pub use crate::rate_limit::{IpRateLimiter, RateDecision};

const MAX_BODY_BYTES: usize = 64 * 1024;
const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

pub type Planner = ItineraryPlanner<Store, DemoCatalog>;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub database_url: Option<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
    pub default_origin: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("WAYFARE_API_KEY").unwrap_or_else(|_| "dev-wayfare-key".to_string()),
            database_url: env::var("WAYFARE_DATABASE_URL")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            rate_limit_window: Duration::from_secs(
                env::var("WAYFARE_API_RATE_LIMIT_WINDOW_SECONDS")
                    .ok()
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60),
            ),
            rate_limit_max: env::var("WAYFARE_API_RATE_LIMIT_MAX")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(80),
            allowed_origins: parse_allowed_origins(env::var("WAYFARE_ALLOWED_ORIGINS").ok()),
            default_origin: env::var("WAYFARE_DEFAULT_ORIGIN")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "New York".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub planner: Arc<Planner>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct CreatedItinerary {
    itinerary_id: String,
    itinerary: Itinerary,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ReallocateRequest {
    selected_categories: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ModifyResponse {
    modifications_made: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    itinerary: Option<Itinerary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_budget: Option<f64>,
}

pub async fn build_app() -> Result<Router> {
    build_app_with_config(ApiConfig::from_env()).await
}

pub async fn build_app_with_config(config: ApiConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let store = match config.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };
    let places = DemoCatalog::load_default().context("failed to load place catalog")?;

    let planner = Arc::new(ItineraryPlanner::new(
        Arc::new(store),
        Arc::new(places),
        metrics.clone(),
        config.default_origin.clone(),
    ));

    let state = ApiState {
        planner,
        metrics,
        api_key: config.api_key,
        limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        allowed_origins: Arc::new(config.allowed_origins),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/budget/validate", post(validate_budget))
        .route(
            "/v1/itineraries",
            get(list_itineraries).post(create_itinerary),
        )
        .route("/v1/itineraries/:itinerary_id", get(get_itinerary))
        .route(
            "/v1/itineraries/:itinerary_id/reallocate",
            post(reallocate_budget),
        )
        .route("/v1/itineraries/:itinerary_id/modify", post(modify_itinerary))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn validate_budget(
    State(state): State<ApiState>,
    Json(input): Json<TripParameters>,
) -> Response {
    match state.planner.validate_budget(&input).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => planner_error_response(err),
    }
}

async fn create_itinerary(
    State(state): State<ApiState>,
    Json(input): Json<TripParameters>,
) -> Response {
    match state.planner.create_itinerary(input).await {
        Ok(itinerary) => (
            StatusCode::OK,
            Json(CreatedItinerary {
                itinerary_id: itinerary.itinerary_id.clone(),
                itinerary,
            }),
        )
            .into_response(),
        Err(err) => planner_error_response(err),
    }
}

async fn list_itineraries(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    match state.planner.recent_itineraries(limit).await {
        Ok(items) => (
            StatusCode::OK,
            Json(serde_json::json!({ "itineraries": items })),
        )
            .into_response(),
        Err(err) => planner_error_response(err),
    }
}

async fn get_itinerary(
    State(state): State<ApiState>,
    Path(itinerary_id): Path<String>,
) -> Response {
    match state.planner.get_itinerary(&itinerary_id).await {
        Ok(itinerary) => (StatusCode::OK, Json(itinerary)).into_response(),
        Err(err) => planner_error_response(err),
    }
}

async fn reallocate_budget(
    State(state): State<ApiState>,
    Path(itinerary_id): Path<String>,
    Json(input): Json<ReallocateRequest>,
) -> Response {
    let categories = match parse_categories(&input.selected_categories) {
        Ok(categories) => categories,
        Err(err) => return planner_error_response(PlannerError::Budget(err)),
    };

    match state
        .planner
        .reallocate_budget(&itinerary_id, &categories)
        .await
    {
        Ok(breakdown) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "budget_breakdown": breakdown
            })),
        )
            .into_response(),
        Err(err) => planner_error_response(err),
    }
}

async fn modify_itinerary(
    State(state): State<ApiState>,
    Path(itinerary_id): Path<String>,
    Json(changes): Json<TripChanges>,
) -> Response {
    let outcome = match state
        .planner
        .modify_itinerary(&itinerary_id, &changes)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => return planner_error_response(err),
    };

    let body = match outcome {
        ModificationOutcome::Regenerated(itinerary) => ModifyResponse {
            modifications_made: true,
            message: "Itinerary updated".to_string(),
            itinerary: Some(itinerary),
            minimum_budget: None,
        },
        ModificationOutcome::BudgetWarning {
            message,
            minimum_budget,
        } => ModifyResponse {
            modifications_made: false,
            message,
            itinerary: None,
            minimum_budget: Some(minimum_budget),
        },
        ModificationOutcome::Unchanged(itinerary) => ModifyResponse {
            modifications_made: false,
            message: "No changes requested".to_string(),
            itinerary: Some(itinerary),
            minimum_budget: None,
        },
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn planner_error_response(err: PlannerError) -> Response {
    match err {
        PlannerError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "not_found",
                "message": format!("itinerary {} not found", id)
            })),
        )
            .into_response(),
        PlannerError::InsufficientBudget(report) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "insufficient_budget",
                "message": report.message,
                "minimum_budget": report.minimum_budget,
                "current_budget": report.current_budget
            })),
        )
            .into_response(),
        PlannerError::Budget(BudgetError::UnknownCategory(category)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "unknown_category",
                "message": format!("unknown budget category: {}", category)
            })),
        )
            .into_response(),
        PlannerError::Budget(BudgetError::InvalidArgument(message)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "invalid_request",
                "message": message
            })),
        )
            .into_response(),
        PlannerError::Internal(err) => {
            error!(error = ?err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "internal_error",
                    "message": "something went wrong, try again later"
                })),
            )
                .into_response()
        }
    }
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    match state.limiter.check(&ip) {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                response
                    .headers_mut()
                    .insert(header::HeaderName::from_static("x-ratelimit-remaining"), value);
            }
            response
        }
        RateDecision::Limited { retry_after } => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limited",
                    "message": "rate limit exceeded for this IP"
                })),
            )
                .into_response();
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}

fn parse_allowed_origins(raw: Option<String>) -> Vec<String> {
    let default_origins = [
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    raw.map(|value| {
        value
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|| {
        default_origins
            .iter()
            .map(|value| value.to_string())
            .collect()
    })
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}
