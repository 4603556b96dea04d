use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use job_search_gateway::{
    config::{get_config, init_config},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    init_config()?;
    let config = get_config();

    let app_state = AppState::new(config)?;
    info!(endpoint = %app_state.jobs_api.endpoint(), "Job listing API configured");

    {
        let views = app_state.views.clone();
        let ttl = config.view_idle_ttl();
        let interval = config.eviction_interval();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let evicted = views.evict_idle(ttl);
                if evicted > 0 {
                    info!(evicted, remaining = views.len(), "Evicted idle listing views");
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let jobs_api = Router::new().route("/api/jobs", get(routes::jobs::list_jobs));

    let views_api = Router::new()
        .route("/api/views", post(routes::views::create_view))
        .route(
            "/api/views/:id",
            get(routes::views::get_view).delete(routes::views::delete_view),
        )
        .route("/api/views/:id/filters", post(routes::views::apply_filter))
        .route("/api/views/:id/navigate", post(routes::views::navigate))
        .route("/api/views/:id/back", post(routes::views::back))
        .route("/api/views/:id/forward", post(routes::views::forward))
        .route("/api/views/:id/page", post(routes::views::go_to_page))
        .route(
            "/api/views/:id/page-size",
            post(routes::views::change_page_size),
        )
        .route("/api/views/:id/refresh", post(routes::views::refresh))
        .route(
            "/api/views/:id/session",
            post(routes::views::login).delete(routes::views::logout),
        );

    let app = base_routes
        .merge(jobs_api)
        .merge(views_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
