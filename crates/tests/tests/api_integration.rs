use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use trails_api::ApiConfig;
use trails_tests::{app, app_with, get, post_json, send, test_config};

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["metrics"]["requests_total"].is_u64());
}

#[tokio::test]
async fn chat_requires_api_key() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": "waterfalls?" }).to_string()))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn catalog_lists_everything_needed_to_render() {
    let (status, body) = send(&app(), get("/v1/catalog")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destinations"].as_array().unwrap().len(), 8);
    assert_eq!(body["products"].as_array().unwrap().len(), 8);
    assert_eq!(body["interests"][0]["id"], "nature");
    assert_eq!(body["interests"][0]["label"], "Nature & Waterfalls");
    assert_eq!(body["quick_prompts"]["assistant"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn destination_search_filters_in_catalog_order() {
    let request = post_json(
        "/v1/destinations/search",
        json!({ "query": "falls", "min_cost": 0, "max_cost": 2000, "sort": "catalog-order" }),
    );

    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::OK);
    let names = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Hundru Falls", "Jonha Falls", "Dassam Falls"]);
}

#[tokio::test]
async fn searches_without_sort_use_page_defaults() {
    let app = app();

    let (status, destinations) = send(&app, post_json("/v1/destinations/search", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let ratings = destinations
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["rating"].as_f64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ratings.len(), 8);
    assert!(ratings.windows(2).all(|pair| pair[0] >= pair[1]));

    let (status, products) = send(&app, post_json("/v1/products/search", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let featured = products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["featured"].as_bool().unwrap())
        .collect::<Vec<_>>();
    let first_plain = featured.iter().position(|f| !f).unwrap_or(featured.len());
    assert!(first_plain > 0);
    assert!(featured[first_plain..].iter().all(|f| !f));
}

#[tokio::test]
async fn product_search_sorts_by_price() {
    let request = post_json(
        "/v1/products/search",
        json!({ "categories": ["packages"], "sort": "price-low" }),
    );

    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::OK);
    let prices = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["cost"].as_u64().unwrap())
        .collect::<Vec<_>>();
    assert!(!prices.is_empty());
    assert!(prices.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn search_rejects_unknown_sort_and_inverted_range() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/v1/products/search", json!({ "sort": "cheapest" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = send(
        &app,
        post_json(
            "/v1/destinations/search",
            json!({ "min_cost": 3000, "max_cost": 100 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"][0]["field"], "cost_range");
}

#[tokio::test]
async fn chat_resolves_rule_and_records_transcript() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json(
            "/v1/chat",
            json!({ "text": "What are the best waterfalls to visit?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_key"], "waterfall");
    assert!(body["reply_text"].as_str().unwrap().contains("Hundru"));

    let session_id = body["session_id"].as_str().unwrap().to_string();
    let (status, session) = send(&app, get(&format!("/v1/sessions/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let messages = session["assistant_chat"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["sender"], "user");
    assert_eq!(messages[2]["sender"], "system");
}

#[tokio::test]
async fn widget_channel_and_reset() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json(
            "/v1/chat",
            json!({ "session_id": "w-1", "text": "How to reach", "channel": "widget" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_key"], "how_to_reach");

    let (status, body) = send(
        &app,
        post_json(
            "/v1/chat/reset",
            json!({ "session_id": "w-1", "channel": "widget" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chat"]["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_chat_is_rejected() {
    let (status, body) = send(&app(), post_json("/v1/chat", json!({ "text": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"][0]["field"], "text");
}

#[tokio::test]
async fn plan_trip_returns_plan_and_total() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json(
            "/v1/plan_trip",
            json!({
                "session_id": "planner",
                "interests": ["nature"],
                "days": 2,
                "budget": 4000,
                "people": 2
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_cost"], 2700);
    let days = body["plan"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["day"].as_u64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(days, vec![1, 2]);

    let (_, session) = send(&app, get("/v1/sessions/planner")).await;
    assert_eq!(session["last_plan"]["total_cost"], 2700);
}

#[tokio::test]
async fn plan_trip_reports_each_invalid_field() {
    let (status, body) = send(
        &app(),
        post_json("/v1/plan_trip", json!({ "interests": [], "days": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["field"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(fields, vec!["budget", "days", "interests"]);
}

#[tokio::test]
async fn plan_trip_rejects_unknown_interest() {
    let (status, _) = send(
        &app(),
        post_json(
            "/v1/plan_trip",
            json!({ "interests": ["shopping"], "days": 2, "budget": 2000 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggle_twice_restores_favorites() {
    let app = app();
    let toggle = || {
        post_json(
            "/v1/selection/toggle",
            json!({ "session_id": "fav-session", "kind": "fav", "target": "destination", "id": 3 }),
        )
    };

    let (status, first) = send(&app, toggle()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["selected"], true);
    assert_eq!(first["kind"], "favorite");
    assert_eq!(first["target"], "destination");

    let (_, second) = send(&app, toggle()).await;
    assert_eq!(second["selected"], false);

    let (_, session) = send(&app, get("/v1/sessions/fav-session")).await;
    assert_eq!(session["selections"]["destination_favorites"], json!([]));
}

#[tokio::test]
async fn favorites_are_kept_per_collection() {
    let app = app();
    let toggle = |target: &str| {
        post_json(
            "/v1/selection/toggle",
            json!({ "session_id": "split", "kind": "favorite", "target": target, "id": 3 }),
        )
    };

    assert_eq!(send(&app, toggle("destination")).await.1["selected"], true);
    assert_eq!(send(&app, toggle("product")).await.1["selected"], true);

    let (_, session) = send(&app, get("/v1/sessions/split")).await;
    assert_eq!(session["selections"]["destination_favorites"], json!([3]));
    assert_eq!(session["selections"]["product_favorites"], json!([3]));

    let (status, body) = send(
        &app,
        post_json(
            "/v1/selection/toggle",
            json!({ "session_id": "split", "kind": "favorite", "id": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"][0]["field"], "target");
}

#[tokio::test]
async fn widget_phrases_keep_their_whitespace() {
    let app = app();
    let ask = |text: &str| {
        post_json(
            "/v1/chat",
            json!({ "session_id": "spacing", "text": text, "channel": "widget" }),
        )
    };

    let (_, exact) = send(&app, ask("Popular destinations")).await;
    assert_eq!(exact["response_key"], "popular_destinations");
    let (_, padded) = send(&app, ask(" Popular destinations")).await;
    assert_eq!(padded["response_key"], "widget_help");
}

#[tokio::test]
async fn toggle_rejects_unknown_kind() {
    let (status, _) = send(
        &app(),
        post_json(
            "/v1/selection/toggle",
            json!({ "kind": "wishlist", "id": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_session_is_404() {
    let (status, body) = send(&app(), get("/v1/sessions/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session_not_found");
}

#[tokio::test]
async fn rate_limit_applies_per_ip() {
    let app = app_with(ApiConfig {
        rate_limit_max: 2,
        rate_limit_window: Duration::from_secs(60),
        ..test_config()
    });

    let from = |ip: &str| {
        let mut request = get("/v1/catalog");
        request
            .headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        request
    };

    assert_eq!(send(&app, from("198.51.100.1")).await.0, StatusCode::OK);
    assert_eq!(send(&app, from("198.51.100.1")).await.0, StatusCode::OK);
    assert_eq!(
        send(&app, from("198.51.100.1")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(&app, from("198.51.100.2")).await.0, StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let text = "a".repeat(80 * 1024);
    let (status, _) = send(&app(), post_json("/v1/chat", json!({ "text": text }))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
