use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use job_search_gateway::config::Config;

pub const CATALOG_SIZE: usize = 47;

/// Query parameters of every request the mock job API received, plus the
/// `Authorization` header under the key `authorization`.
pub type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn list_jobs(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(mut params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        params.insert("authorization".into(), auth.to_string());
    }
    seen.lock().unwrap().push(params);

    let start = offset * limit;
    let end = (start + limit).min(CATALOG_SIZE);
    let items: Vec<_> = (start..end)
        .map(|i| {
            json!({
                "id": i + 1,
                "job_title": format!("Engineer #{}", i + 1),
                "company_name": "Acme",
                "min_amount": 1500,
                "max_amount": 3000,
                "posted_date": "2025-04-02",
                "addresses": [{"city": "Da Nang", "country": "Vietnam"}],
                "tags": ["Rust"]
            })
        })
        .collect();
    Json(json!({"items": items, "total_count": CATALOG_SIZE}))
}

async fn broken() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "database unavailable"})),
    )
}

/// Starts a job API on a random port. Returns its base URL.
pub async fn spawn_upstream() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/v1/jobs", get(list_jobs))
        .route("/broken/jobs", get(broken))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
    let addr = listener.local_addr().expect("upstream addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("upstream server");
    });
    (format!("http://{}", addr), seen)
}

pub fn config_for(jobs_api_url: String) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        jobs_api_url,
        upstream_timeout_secs: 5,
        view_idle_ttl_secs: 1800,
        eviction_interval_secs: 60,
    }
}

pub fn last_request(seen: &Seen) -> HashMap<String, String> {
    seen.lock().unwrap().last().cloned().expect("no upstream request")
}
