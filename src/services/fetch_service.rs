use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::filter::FilterState;
use crate::models::listing::{ListingPage, ListingResponse};
use crate::services::job_api_service::{ListingQuery, ListingSource};
use crate::utils::time::today;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchSnapshot {
    pub status: FetchStatus,
    pub listing: ListingPage,
    pub error: Option<String>,
    pub latest_epoch: u64,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Applied(FetchSnapshot),
    /// A newer request was issued while this one was in flight.
    Stale { epoch: u64, latest: u64 },
}

#[derive(Debug)]
struct VisibleState {
    latest_epoch: u64,
    status: FetchStatus,
    listing: ListingPage,
    error: Option<String>,
}

impl VisibleState {
    fn snapshot(&self) -> FetchSnapshot {
        FetchSnapshot {
            status: self.status,
            listing: self.listing.clone(),
            error: self.error.clone(),
            latest_epoch: self.latest_epoch,
        }
    }
}

/// Issues listing requests and applies only the result of the most recently
/// issued one. Superseded requests are not cancelled; their results are dropped.
pub struct FetchController<S> {
    source: S,
    state: Mutex<VisibleState>,
}

impl<S: ListingSource> FetchController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(VisibleState {
                latest_epoch: 0,
                status: FetchStatus::Idle,
                listing: ListingPage::empty(0),
                error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VisibleState> {
        self.state.lock().expect("fetch controller mutex poisoned")
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        self.lock().snapshot()
    }

    pub async fn fetch_page(&self, filter: &FilterState, bearer: Option<&str>) -> FetchOutcome {
        self.fetch_page_on(filter, bearer, today()).await
    }

    pub async fn fetch_page_on(
        &self,
        filter: &FilterState,
        bearer: Option<&str>,
        today: NaiveDate,
    ) -> FetchOutcome {
        let epoch = self.begin();
        info!(epoch, page = filter.page, page_size = filter.page_size, "Fetching job listing");

        let query = ListingQuery::from_filter(filter, today);
        let result = self.source.fetch_listing(&query, bearer).await;
        self.complete(epoch, result)
    }

    /// Forgets whatever is visible and makes every in-flight request stale.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.latest_epoch += 1;
        state.status = FetchStatus::Idle;
        state.listing = ListingPage::empty(state.latest_epoch);
        state.error = None;
        debug!(epoch = state.latest_epoch, "Listing invalidated");
    }

    fn begin(&self) -> u64 {
        let mut state = self.lock();
        state.latest_epoch += 1;
        state.status = FetchStatus::Loading;
        state.latest_epoch
    }

    fn complete(&self, epoch: u64, result: Result<ListingResponse>) -> FetchOutcome {
        let mut state = self.lock();
        if epoch != state.latest_epoch {
            debug!(epoch, latest = state.latest_epoch, "Discarding stale listing response");
            return FetchOutcome::Stale {
                epoch,
                latest: state.latest_epoch,
            };
        }

        match result {
            Ok(response) => {
                state.listing = ListingPage::from_response(response, epoch);
                state.status = FetchStatus::Success;
                state.error = None;
                info!(
                    epoch,
                    items = state.listing.items.len(),
                    total = state.listing.total_count,
                    "Job listing loaded"
                );
            }
            Err(err) => {
                warn!(epoch, error = %err, "Job listing request failed");
                state.listing = ListingPage::empty(epoch);
                state.status = FetchStatus::Failure;
                state.error = Some(err.to_string());
            }
        }

        FetchOutcome::Applied(state.snapshot())
    }
}
