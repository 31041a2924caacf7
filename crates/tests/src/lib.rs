//! Shared helpers for driving the HTTP router in integration tests.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use trails_agents::ReplyDelays;
use trails_api::{build_app, ApiConfig};

pub const API_KEY: &str = "test-trails-key";

pub fn test_config() -> ApiConfig {
    ApiConfig {
        api_key: API_KEY.to_string(),
        delays: ReplyDelays::none(),
        ..ApiConfig::default()
    }
}

pub fn app() -> Router {
    app_with(test_config())
}

pub fn app_with(config: ApiConfig) -> Router {
    build_app(&config).expect("app should build")
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .expect("request should build")
}

/// Sends `request` through a clone of `app` and decodes the JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}
