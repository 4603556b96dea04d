use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Redirect, Response},
};
use tracing::debug;

use crate::{
    dto::listing_dto::ListingViewResponse,
    error::{Error, Result},
    services::{
        fetch_service::{FetchController, FetchOutcome, FetchStatus},
        session_service::bearer_token,
        url_sync_service::{decode, encode, location_for},
    },
    AppState,
};

const JOBS_PATH: &str = "/api/jobs";

/// One page of the listing for a shareable query string. Queries that are not
/// in canonical form are redirected to the form the listing page would use.
#[utoipa::path(
    get,
    path = "/api/jobs",
    responses(
        (status = 200, description = "Listing page"),
        (status = 307, description = "Redirect to the canonical query"),
        (status = 502, description = "Job listing service failed")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let raw = raw.unwrap_or_default();
    let filter = decode(&raw);
    let canonical = encode(&filter);
    if canonical != raw {
        let target = if canonical.is_empty() {
            JOBS_PATH.to_string()
        } else {
            format!("{}?{}", JOBS_PATH, canonical)
        };
        debug!(from = %raw, to = %target, "Redirecting to canonical listing query");
        return Ok(Redirect::temporary(&target).into_response());
    }

    let controller = FetchController::new(state.jobs_api.clone());
    let snapshot = match controller.fetch_page(&filter, bearer_token(&headers)).await {
        FetchOutcome::Applied(snapshot) => snapshot,
        FetchOutcome::Stale { .. } => controller.snapshot(),
    };
    if snapshot.status == FetchStatus::Failure {
        return Err(Error::Fetch(snapshot.error.unwrap_or_default()));
    }

    let body = ListingViewResponse::from_fetch(location_for(&canonical), filter, &snapshot);
    Ok(Json(body).into_response())
}
