mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header::LOCATION, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use common::{config_for, last_request, spawn_upstream};

fn listing_api(state: job_search_gateway::AppState) -> Router {
    Router::new()
        .route("/health", get(job_search_gateway::routes::health::health))
        .route("/api/jobs", get(job_search_gateway::routes::jobs::list_jobs))
        .with_state(state)
}

#[tokio::test]
async fn listing_api_end_to_end() {
    let (base, seen) = spawn_upstream().await;
    let config = config_for(format!("{}/api/v1/jobs", base));
    let app_state = job_search_gateway::AppState::new(&config).expect("app state");
    let app = listing_api(app_state);

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok", "views": 0}));

    let req = Request::builder()
        .method("GET")
        .uri("/api/jobs?city=Da+Nang")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["location"], "/jobs?city=Da+Nang");
    assert_eq!(body["status"], "success");
    assert_eq!(body["total_count"], 47);
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["items"][0]["salary"], "$1.5K - $3K");
    assert_eq!(body["items"][0]["location"], "Da Nang, Vietnam");
    assert_eq!(body["pagination"]["pages"], json!([1, 2, 3, 4, 5]));
    assert_eq!(body["pagination"]["range"], json!({"from": 1, "to": 10}));
    assert_eq!(body["salary_range"], "negotiable");
    assert!(body.get("view_id").is_none());

    let upstream = last_request(&seen);
    assert_eq!(upstream["city"], "Da Nang");
    assert_eq!(upstream["offset"], "0");
    assert_eq!(upstream["limit"], "10");
    assert_eq!(upstream["negotiated"], "true");
    assert!(!upstream.contains_key("authorization"));

    let req = Request::builder()
        .method("GET")
        .uri("/api/jobs?page=5&city=Da+Nang&min_salary=2000&max_salary=5000")
        .header("Authorization", "Bearer opaque-token")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let target = resp.headers()[LOCATION].to_str().unwrap().to_string();
    assert_eq!(
        target,
        "/api/jobs?city=Da+Nang&negotiated=false&min_salary=2000&max_salary=5000&page=5"
    );
    let requests_before = seen.lock().unwrap().len();

    let req = Request::builder()
        .method("GET")
        .uri(target)
        .header("Authorization", "Bearer opaque-token")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["salary_range"], "2000-5000");
    assert_eq!(body["items"].as_array().unwrap().len(), 7);
    assert_eq!(body["pagination"]["range"], json!({"from": 41, "to": 47}));
    assert_eq!(body["pagination"]["has_next"], false);
    assert_eq!(seen.lock().unwrap().len(), requests_before + 1);

    let upstream = last_request(&seen);
    assert_eq!(upstream["offset"], "4");
    assert_eq!(upstream["min_salary"], "2000");
    assert_eq!(upstream["authorization"], "Bearer opaque-token");

    let req = Request::builder()
        .method("GET")
        .uri("/api/jobs?city=All+City")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers()[LOCATION], "/api/jobs");
}

#[tokio::test]
async fn listing_api_reports_upstream_failure() {
    let (base, _seen) = spawn_upstream().await;
    let config = config_for(format!("{}/broken/jobs", base));
    let app = listing_api(job_search_gateway::AppState::new(&config).expect("app state"));

    let req = Request::builder()
        .method("GET")
        .uri("/api/jobs")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("database unavailable"));
}
