use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wayfare_api::{build_app_with_config, ApiConfig};

const API_KEY: &str = "test-key";

fn config() -> ApiConfig {
    ApiConfig {
        api_key: API_KEY.to_string(),
        database_url: None,
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 1_000,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        default_origin: "New York".to_string(),
    }
}

async fn app() -> Router {
    build_app_with_config(config()).await.expect("app should build")
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, parsed)
}

fn paris_trip(budget: f64) -> Value {
    json!({
        "destination": "Paris, France",
        "budget": budget,
        "duration": 4,
        "travelers": 2,
        "activity_preference": "moderate",
        "include_flights": true,
        "include_hotels": true
    })
}

async fn create(app: &Router, budget: f64) -> Value {
    let (status, body) = send(app, post("/v1/itineraries", paris_trip(budget))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn itineraries_require_api_key() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/itineraries")
        .header("content-type", "application/json")
        .body(Body::from(paris_trip(20_000.0).to_string()))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn validate_reports_minimum_budget() {
    let app = app().await;

    let (status, body) = send(&app, post("/v1/budget/validate", paris_trip(100.0))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sufficient"], false);
    assert_eq!(body["current_budget"], 100.0);
    assert!(body["minimum_budget"].as_f64().unwrap() > 100.0);
    assert!(body["breakdown"]["flights"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn create_returns_reconciled_allocation() {
    let app = app().await;
    let body = create(&app, 20_000.0).await;

    let id = body["itinerary_id"].as_str().unwrap();
    assert_eq!(body["itinerary"]["itinerary_id"], id);
    assert_eq!(body["itinerary"]["daily_activities"].as_array().unwrap().len(), 4);

    let breakdown = &body["itinerary"]["budget_breakdown"];
    let categories = breakdown["categories"].as_object().unwrap();
    for key in ["flights", "hotels", "food", "travel", "activities"] {
        assert!(categories.contains_key(key), "missing {key}");
    }
    let sum = categories
        .values()
        .map(|entry| entry["amount"].as_f64().unwrap())
        .sum::<f64>();
    let remaining = breakdown["remaining_budget"].as_f64().unwrap();
    assert!((sum + remaining - 20_000.0).abs() <= 0.01);
}

#[tokio::test]
async fn insufficient_budget_is_rejected() {
    let app = app().await;

    let (status, body) = send(&app, post("/v1/itineraries", paris_trip(100.0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_budget");
    assert_eq!(body["current_budget"], 100.0);
    assert!(body["minimum_budget"].as_f64().unwrap() > 100.0);
    assert!(body["message"].as_str().unwrap().contains("$100.00"));
}

#[tokio::test]
async fn invalid_trip_shape_is_unprocessable() {
    let app = app().await;
    let mut trip = paris_trip(5_000.0);
    trip["travelers"] = json!(0);

    let (status, body) = send(&app, post("/v1/itineraries", trip)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn stored_itinerary_can_be_fetched() {
    let app = app().await;
    let created = create(&app, 20_000.0).await;
    let id = created["itinerary_id"].as_str().unwrap();

    let (status, body) = send(&app, get(&format!("/v1/itineraries/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created["itinerary"]);

    let (status, body) = send(&app, get("/v1/itineraries?limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itineraries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_itinerary_is_not_found() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/itineraries/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn reallocate_folds_buffer_into_selection() {
    let app = app().await;
    let created = create(&app, 20_000.0).await;
    let id = created["itinerary_id"].as_str().unwrap();
    let before = &created["itinerary"]["budget_breakdown"];
    let buffer = before["remaining_budget"].as_f64().unwrap();
    assert!(buffer > 0.0);

    let (status, body) = send(
        &app,
        post(
            &format!("/v1/itineraries/{id}/reallocate"),
            json!({ "selected_categories": ["activities"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let after = &body["budget_breakdown"];
    assert_eq!(after["remaining_budget"], 0.0);
    let gained = after["categories"]["activities"]["amount"].as_f64().unwrap()
        - before["categories"]["activities"]["amount"].as_f64().unwrap();
    assert!((gained - buffer).abs() <= 0.01);
    assert_eq!(
        after["categories"]["flights"]["amount"],
        before["categories"]["flights"]["amount"]
    );

    let (_, stored) = send(&app, get(&format!("/v1/itineraries/{id}"))).await;
    assert_eq!(&stored["budget_breakdown"], after);
}

#[tokio::test]
async fn reallocate_rejects_unknown_category() {
    let app = app().await;
    let created = create(&app, 20_000.0).await;
    let id = created["itinerary_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        post(
            &format!("/v1/itineraries/{id}/reallocate"),
            json!({ "selected_categories": ["food", "souvenirs"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unknown_category");
}

#[tokio::test]
async fn modify_regenerates_under_same_id() {
    let app = app().await;
    let created = create(&app, 20_000.0).await;
    let id = created["itinerary_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        post(
            &format!("/v1/itineraries/{id}/modify"),
            json!({ "duration": 6 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modifications_made"], true);
    assert_eq!(body["itinerary"]["itinerary_id"], id);
    assert_eq!(body["itinerary"]["daily_activities"].as_array().unwrap().len(), 6);
    assert_eq!(body["itinerary"]["parameters"]["travelers"], 2);
}

#[tokio::test]
async fn modify_with_low_budget_returns_warning() {
    let app = app().await;
    let created = create(&app, 20_000.0).await;
    let id = created["itinerary_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        post(&format!("/v1/itineraries/{id}/modify"), json!({ "budget": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modifications_made"], false);
    assert!(body["minimum_budget"].as_f64().unwrap() > 100.0);
    assert!(body.get("itinerary").is_none());

    let (_, stored) = send(&app, get(&format!("/v1/itineraries/{id}"))).await;
    assert_eq!(stored["parameters"]["budget"], 20_000.0);
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let app = build_app_with_config(ApiConfig {
        rate_limit_max: 1,
        ..config()
    })
    .await
    .unwrap();

    let first = app
        .clone()
        .oneshot(get("/v1/itineraries/none"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::NOT_FOUND);

    let second = app
        .clone()
        .oneshot(get("/v1/itineraries/none"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().get("retry-after").is_some());

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
