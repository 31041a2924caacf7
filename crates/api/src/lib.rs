mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Json, Path, State};
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
use tracing::{debug, error};
use trails_agents::{ChatInput, ReplyDelays, TourismAgent};
use trails_core::{
    Catalog, Category, ChatChannel, CostRange, EngineError, EngineResult, FilterCriteria,
    InterestTag, SelectionKind, SelectionTarget, SortKey, TripRequest,
};
use trails_observability::{AppMetrics, MetricsSnapshot};
use trails_storage::MemoryStore;

pub use crate::rate_limit::IpRateLimiter;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Runtime settings, read from `TRAILS_*` environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub api_key: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
    pub delays: ReplyDelays,
    pub session_ttl: chrono::Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            api_key: "dev-trails-key".to_string(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            delays: ReplyDelays::default(),
            session_ttl: chrono::Duration::hours(24),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: env::var("TRAILS_BIND").unwrap_or(defaults.bind),
            api_key: env::var("TRAILS_API_KEY")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.api_key),
            rate_limit_window: env_parse::<u64>("TRAILS_RATE_LIMIT_WINDOW_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: env_parse("TRAILS_RATE_LIMIT_MAX").unwrap_or(defaults.rate_limit_max),
            allowed_origins: parse_allowed_origins().unwrap_or(defaults.allowed_origins),
            delays: ReplyDelays::from_env(),
            session_ttl: env_parse::<i64>("TRAILS_SESSION_TTL_HOURS")
                .filter(|hours| *hours > 0)
                .map(chrono::Duration::hours)
                .unwrap_or(defaults.session_ttl),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_allowed_origins() -> Option<Vec<String>> {
    let origins = env::var("TRAILS_ALLOWED_ORIGINS")
        .ok()?
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect::<Vec<_>>();
    (!origins.is_empty()).then_some(origins)
}

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<TourismAgent<MemoryStore>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

impl ApiState {
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let catalog = Catalog::jharkhand();
        catalog.validate().context("catalog fixtures are invalid")?;

        let metrics = AppMetrics::shared();
        let agent = TourismAgent::new(
            Arc::new(catalog),
            Arc::new(MemoryStore::new()),
            metrics.clone(),
            config.delays,
        )
        .with_session_ttl(config.session_ttl);

        Ok(Self {
            agent: Arc::new(agent),
            metrics,
            api_key: config.api_key.clone(),
            limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
            allowed_origins: Arc::new(config.allowed_origins.clone()),
        })
    }
}

pub fn build_app(config: &ApiConfig) -> Result<Router> {
    Ok(build_router(ApiState::from_config(config)?))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/catalog", get(catalog_overview))
        .route("/v1/destinations/search", post(search_destinations))
        .route("/v1/products/search", post(search_products))
        .route("/v1/chat", post(chat))
        .route("/v1/chat/reset", post(reset_chat))
        .route("/v1/plan_trip", post(plan_trip))
        .route("/v1/selection/toggle", post(toggle_selection))
        .route("/v1/sessions/:session_id", get(session_snapshot))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        // Set runs outside Propagate so generated ids reach the response.
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
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

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn catalog_overview(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.agent.catalog_overview())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchRequest {
    query: String,
    min_cost: Option<u32>,
    max_cost: Option<u32>,
    categories: Vec<String>,
    sort: Option<String>,
}

impl SearchRequest {
    fn into_criteria(self) -> EngineResult<FilterCriteria> {
        let mut criteria = FilterCriteria::new()
            .with_query(self.query)
            .with_cost_range(CostRange::from_bounds(self.min_cost, self.max_cost)?);
        for label in &self.categories {
            criteria = criteria.with_category(Category::parse(label)?);
        }
        if let Some(sort) = self.sort.as_deref() {
            criteria = criteria.sorted_by(SortKey::parse(sort)?);
        }
        Ok(criteria)
    }
}

async fn search_destinations(
    State(state): State<ApiState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    match request.into_criteria() {
        Ok(criteria) => Json(state.agent.search_destinations(&criteria)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

async fn search_products(
    State(state): State<ApiState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    match request.into_criteria() {
        Ok(criteria) => Json(state.agent.search_products(&criteria)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    text: String,
    channel: Option<String>,
}

fn parse_channel(value: Option<&str>) -> EngineResult<ChatChannel> {
    value.map_or(Ok(ChatChannel::Assistant), ChatChannel::parse)
}

async fn chat(State(state): State<ApiState>, Json(request): Json<ChatRequest>) -> Response {
    let channel = match parse_channel(request.channel.as_deref()) {
        Ok(channel) => channel,
        Err(error) => return error_response(error.into()),
    };
    let input = ChatInput {
        session_id: request.session_id,
        text: request.text,
        channel,
    };

    match state.agent.chat(input).await {
        Ok(reply) => Json(reply).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct ResetChatRequest {
    session_id: Option<String>,
    channel: Option<String>,
}

async fn reset_chat(
    State(state): State<ApiState>,
    Json(request): Json<ResetChatRequest>,
) -> Response {
    let channel = match parse_channel(request.channel.as_deref()) {
        Ok(channel) => channel,
        Err(error) => return error_response(error.into()),
    };

    match state.agent.reset_chat(request.session_id, channel).await {
        Ok(session) => Json(serde_json::json!({
            "session_id": session.session_id,
            "channel": channel,
            "chat": session.chat(channel),
        }))
        .into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct PlanTripRequest {
    session_id: Option<String>,
    #[serde(default)]
    interests: Vec<String>,
    days: Option<u32>,
    budget: Option<u32>,
    people: Option<u32>,
}

impl PlanTripRequest {
    fn into_trip_request(self) -> EngineResult<(Option<String>, TripRequest)> {
        let interests = self
            .interests
            .iter()
            .map(|value| InterestTag::parse(value))
            .collect::<EngineResult<Vec<_>>>()?;
        let request = TripRequest {
            interests,
            days: self.days,
            budget: self.budget,
            // The planner form defaults to a party of one.
            people: self.people.or(Some(1)),
        };
        Ok((self.session_id, request))
    }
}

async fn plan_trip(
    State(state): State<ApiState>,
    Json(request): Json<PlanTripRequest>,
) -> Response {
    let (session_id, request) = match request.into_trip_request() {
        Ok(parsed) => parsed,
        Err(error) => return error_response(error.into()),
    };

    match state.agent.plan_trip(session_id, request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    session_id: Option<String>,
    kind: String,
    /// `destination` or `product`; optional for the cart, which only holds
    /// products.
    target: Option<String>,
    id: u32,
}

impl ToggleRequest {
    fn selection(&self) -> EngineResult<(SelectionKind, SelectionTarget)> {
        let kind = SelectionKind::parse(&self.kind)?;
        let target = match (self.target.as_deref(), kind) {
            (Some(target), _) => SelectionTarget::parse(target)?,
            (None, SelectionKind::Cart) => SelectionTarget::Product,
            (None, SelectionKind::Favorite) => {
                return Err(EngineError::invalid(
                    "target",
                    "favorites need a target of destination or product",
                ))
            }
        };
        Ok((kind, target))
    }
}

async fn toggle_selection(
    State(state): State<ApiState>,
    Json(request): Json<ToggleRequest>,
) -> Response {
    let (kind, target) = match request.selection() {
        Ok(selection) => selection,
        Err(error) => return error_response(error.into()),
    };

    match state
        .agent
        .toggle_selection(request.session_id, kind, target, request.id)
        .await
    {
        Ok(reply) => Json(reply).into_response(),
        Err(error) => error_response(error),
    }
}

async fn session_snapshot(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.agent.session_snapshot(&session_id).await {
        Ok(Some(session)) => Json(session).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "session_not_found",
                "message": format!("no active session {session_id}")
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

/// Caller mistakes become 400 with the offending fields; anything else is a
/// 500 whose detail stays in the logs.
fn error_response(error: anyhow::Error) -> Response {
    match error.downcast_ref::<EngineError>() {
        Some(engine) if engine.is_caller_error() => {
            debug!(error = %engine, "request rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "invalid_request",
                    "message": engine.to_string(),
                    "issues": engine.issues(),
                })),
            )
                .into_response()
        }
        _ => {
            error!(error = ?error, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "internal_error",
                    "message": "the request could not be completed"
                })),
            )
                .into_response()
        }
    }
}

fn is_public_endpoint(path: &str) -> bool {
    path == "/health"
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
        debug!(path = %request.uri().path(), "missing or invalid api key");
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

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        debug!(ip = %ip, "rate limited");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}
