use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::filter::{is_valid_page_size, FilterChange, FilterState};
use crate::services::fetch_service::{FetchController, FetchOutcome, FetchSnapshot, FetchStatus};
use crate::services::job_api_service::ListingSource;
use crate::services::pagination_service::{self, PaginationModel};
use crate::services::session_service::{Session, SessionContext, SessionEvent};
use crate::services::url_sync_service::{History, MemoryHistory, UrlSynchronizer};

/// Everything one listing page shows at a given moment.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub id: Uuid,
    pub location: String,
    pub filter: FilterState,
    pub fetch: FetchSnapshot,
    pub pagination: PaginationModel,
    pub session: Option<Session>,
}

/// One open listing page: its address bar, its fetch controller and the
/// session it fetches with.
pub struct ListingView<S> {
    id: Uuid,
    sync: Mutex<UrlSynchronizer<MemoryHistory>>,
    controller: FetchController<S>,
    session: SessionContext,
    session_events: Mutex<broadcast::Receiver<SessionEvent>>,
    last_active: Mutex<Instant>,
}

impl<S: ListingSource> ListingView<S> {
    fn new(source: S, initial_query: &str) -> Self {
        let session = SessionContext::new();
        let session_events = Mutex::new(session.subscribe());
        Self {
            id: Uuid::new_v4(),
            sync: Mutex::new(UrlSynchronizer::mount(MemoryHistory::new(initial_query))),
            controller: FetchController::new(source),
            session,
            session_events,
            last_active: Mutex::new(Instant::now()),
        }
    }

    /// Opens a view on `initial_query` and loads its first page.
    pub async fn mount(source: S, initial_query: &str, bearer: Option<&str>) -> Result<Self> {
        let view = Self::new(source, initial_query);
        if let Some(token) = bearer {
            view.session.login(token, None)?;
        }
        view.load().await;
        Ok(view)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock_sync(&self) -> MutexGuard<'_, UrlSynchronizer<MemoryHistory>> {
        self.sync.lock().expect("url synchronizer mutex poisoned")
    }

    pub fn touch(&self) {
        *self.last_active.lock().expect("activity mutex poisoned") = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.lock().expect("activity mutex poisoned").elapsed()
    }

    pub fn filter(&self) -> FilterState {
        self.lock_sync().state().clone()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let (location, filter) = {
            let sync = self.lock_sync();
            (sync.location(), sync.state().clone())
        };
        let fetch = self.controller.snapshot();
        let pagination =
            PaginationModel::new(filter.page, filter.page_size, fetch.listing.total_count);
        ViewSnapshot {
            id: self.id,
            location,
            filter,
            fetch,
            pagination,
            session: self.session.current(),
        }
    }

    /// Applies a setter call. Page and page size changes go through the same
    /// checks as [`Self::go_to_page`] and [`Self::change_page_size`].
    pub async fn apply_change(&self, change: FilterChange) -> Result<ViewSnapshot> {
        match change {
            FilterChange::Page(page) => self.go_to_page(page).await,
            FilterChange::PageSize(page_size) => self.change_page_size(page_size).await,
            change => self.commit_change(change).await,
        }
    }

    async fn commit_change(&self, change: FilterChange) -> Result<ViewSnapshot> {
        let moved_to = self.lock_sync().update(change)?;
        if let Some(location) = moved_to {
            debug!(view = %self.id, %location, "Filter changed");
            self.load().await;
        }
        Ok(self.snapshot())
    }

    /// Follows a link to the listing page, as if typed into the address bar.
    pub async fn navigate(&self, query: &str) -> ViewSnapshot {
        let adopted = {
            let mut sync = self.lock_sync();
            sync.history_mut().push(query.to_string());
            sync.on_location_changed()
        };
        if adopted.is_some() {
            self.load().await;
        }
        self.snapshot()
    }

    pub async fn back(&self) -> ViewSnapshot {
        let adopted = {
            let mut sync = self.lock_sync();
            if sync.history_mut().back() {
                sync.on_location_changed()
            } else {
                None
            }
        };
        if adopted.is_some() {
            self.load().await;
        }
        self.snapshot()
    }

    pub async fn forward(&self) -> ViewSnapshot {
        let adopted = {
            let mut sync = self.lock_sync();
            if sync.history_mut().forward() {
                sync.on_location_changed()
            } else {
                None
            }
        };
        if adopted.is_some() {
            self.load().await;
        }
        self.snapshot()
    }

    /// Moves to `page` when it exists in the listing; anything else leaves the
    /// view as it is. Without a loaded listing only `page >= 1` is checked, so a
    /// page change can still retry after a failure.
    pub async fn go_to_page(&self, page: u32) -> Result<ViewSnapshot> {
        let total_pages = {
            let fetch = self.controller.snapshot();
            match fetch.status {
                FetchStatus::Failure | FetchStatus::Idle => u32::MAX,
                FetchStatus::Loading | FetchStatus::Success => pagination_service::total_pages(
                    fetch.listing.total_count,
                    self.filter().page_size,
                ),
            }
        };
        match pagination_service::go_to_page(page, total_pages) {
            Some(change) => self.commit_change(change).await,
            None => {
                debug!(view = %self.id, page, total_pages, "Ignoring page outside the listing");
                Ok(self.snapshot())
            }
        }
    }

    pub async fn change_page_size(&self, page_size: u32) -> Result<ViewSnapshot> {
        if !is_valid_page_size(page_size) {
            return Err(Error::invalid_selection("page_size", page_size));
        }

        let fetch = self.controller.snapshot();
        let moved_to = {
            let mut sync = self.lock_sync();
            let current = sync.state().clone();
            let page = match fetch.status {
                FetchStatus::Failure | FetchStatus::Idle => current.page,
                FetchStatus::Loading | FetchStatus::Success => pagination_service::change_page_size(
                    current.page,
                    fetch.listing.total_count,
                    page_size,
                ),
            };
            sync.commit(FilterState {
                page,
                page_size,
                ..current
            })
        };
        if moved_to.is_some() {
            self.load().await;
        }
        Ok(self.snapshot())
    }

    /// Refetches the current state, e.g. to retry after a failure.
    pub async fn refresh(&self) -> ViewSnapshot {
        self.load().await;
        self.snapshot()
    }

    pub async fn login(&self, token: &str, user: Option<JsonValue>) -> Result<ViewSnapshot> {
        self.session.login(token, user)?;
        self.load().await;
        Ok(self.snapshot())
    }

    pub async fn logout(&self) -> ViewSnapshot {
        if self.session.logout() {
            self.load().await;
        }
        self.snapshot()
    }

    /// Reacts to session events since the last request. A logout forgets the
    /// results that were fetched with the old token.
    fn drain_session_events(&self) {
        let mut events = self.session_events.lock().expect("session events mutex poisoned");
        loop {
            match events.try_recv() {
                Ok(SessionEvent::LoggedOut) | Err(TryRecvError::Lagged(_)) => {
                    info!(view = %self.id, "Session ended, discarding personalized results");
                    self.controller.invalidate();
                }
                Ok(SessionEvent::LoggedIn { .. }) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    async fn load(&self) -> FetchOutcome {
        self.touch();
        let filter = self.filter();
        let bearer = self.session.bearer();
        self.drain_session_events();
        self.controller.fetch_page(&filter, bearer.as_deref()).await
    }
}

/// Open listing views by id.
pub struct ViewRegistry<S> {
    source: S,
    views: RwLock<HashMap<Uuid, Arc<ListingView<S>>>>,
}

impl<S: ListingSource + Clone> ViewRegistry<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            views: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(
        &self,
        initial_query: &str,
        bearer: Option<&str>,
    ) -> Result<Arc<ListingView<S>>> {
        let view = Arc::new(ListingView::mount(self.source.clone(), initial_query, bearer).await?);
        self.views
            .write()
            .expect("view registry lock poisoned")
            .insert(view.id(), view.clone());
        info!(view = %view.id(), "Listing view opened");
        Ok(view)
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<ListingView<S>>> {
        let view = self
            .views
            .read()
            .expect("view registry lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Listing view {} not found", id)))?;
        view.touch();
        Ok(view)
    }

    pub fn remove(&self, id: Uuid) -> Result<()> {
        self.views
            .write()
            .expect("view registry lock poisoned")
            .remove(&id)
            .map(|_| info!(view = %id, "Listing view closed"))
            .ok_or_else(|| Error::NotFound(format!("Listing view {} not found", id)))
    }

    /// Drops views nobody has touched for `ttl`. Returns how many went.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let mut views = self.views.write().expect("view registry lock poisoned");
        let before = views.len();
        views.retain(|_, view| view.idle_for() < ttl);
        before - views.len()
    }

    pub fn len(&self) -> usize {
        self.views.read().expect("view registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
