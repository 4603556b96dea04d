use std::collections::HashMap;

use tracing::debug;
use url::form_urlencoded;

use crate::error::Result;
use crate::models::filter::{
    is_valid_page_size, is_valid_posted_period, normalize_city, EmploymentType, FilterChange,
    FilterState, JobSource, SortBy, SortDirection, WireEnum, WorkMode,
};

pub const LISTING_PATH: &str = "/jobs";

const KEY_QUERY: &str = "query";
const KEY_CITY: &str = "city";
const KEY_WORK_MODE: &str = "work_mode";
const KEY_EMPLOYMENT_TYPE: &str = "employment_type";
const KEY_SOURCE: &str = "source";
const KEY_POSTED_PERIOD: &str = "posted_period";
const KEY_NEGOTIATED: &str = "negotiated";
const KEY_MIN_SALARY: &str = "min_salary";
const KEY_MAX_SALARY: &str = "max_salary";
const KEY_SORT_BY: &str = "sort_by";
const KEY_DIRECTION: &str = "direction";
const KEY_PAGE: &str = "page";
const KEY_PAGE_SIZE: &str = "page_size";
// Older links carried the upstream paging parameters directly.
const KEY_LEGACY_OFFSET: &str = "offset";
const KEY_LEGACY_LIMIT: &str = "limit";

/// Serializes every field that differs from its default. Equal states always
/// produce the same string.
pub fn encode(state: &FilterState) -> String {
    let state = state.clone().canonicalize();
    let defaults = FilterState::default();
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !state.query.is_empty() {
        serializer.append_pair(KEY_QUERY, &state.query);
    }
    if !state.city.is_empty() {
        serializer.append_pair(KEY_CITY, &state.city);
    }
    if let Some(work_mode) = state.work_mode {
        serializer.append_pair(KEY_WORK_MODE, work_mode.as_str());
    }
    if let Some(employment_type) = state.employment_type {
        serializer.append_pair(KEY_EMPLOYMENT_TYPE, employment_type.as_str());
    }
    if let Some(source) = state.source {
        serializer.append_pair(KEY_SOURCE, source.as_str());
    }
    if let Some(days) = state.posted_period {
        serializer.append_pair(KEY_POSTED_PERIOD, &days.to_string());
    }
    if state.negotiated != defaults.negotiated {
        serializer.append_pair(KEY_NEGOTIATED, &state.negotiated.to_string());
    }
    if !state.negotiated {
        if state.salary_min > 0 {
            serializer.append_pair(KEY_MIN_SALARY, &state.salary_min.to_string());
        }
        if state.salary_max > 0 {
            serializer.append_pair(KEY_MAX_SALARY, &state.salary_max.to_string());
        }
    }
    if state.sort_by != defaults.sort_by {
        serializer.append_pair(KEY_SORT_BY, state.sort_by.as_str());
    }
    if state.direction != defaults.direction {
        serializer.append_pair(KEY_DIRECTION, state.direction.as_str());
    }
    if state.page != defaults.page {
        serializer.append_pair(KEY_PAGE, &state.page.to_string());
    }
    if state.page_size != defaults.page_size {
        serializer.append_pair(KEY_PAGE_SIZE, &state.page_size.to_string());
    }

    serializer.finish()
}

/// Parses a query string into a canonical state. Never fails: unknown keys are
/// ignored and malformed values fall back to the field default.
pub fn decode(query: &str) -> FilterState {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params: HashMap<String, String> = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }

    let defaults = FilterState::default();
    let mut state = defaults.clone();

    if let Some(query) = params.get(KEY_QUERY) {
        state.query = query.trim().to_string();
    }
    if let Some(city) = params.get(KEY_CITY) {
        state.city = normalize_city(city);
    }
    state.work_mode = optional_enum::<WorkMode>(&params);
    state.employment_type = optional_enum::<EmploymentType>(&params);
    state.source = optional_enum::<JobSource>(&params);
    state.posted_period = params.get(KEY_POSTED_PERIOD).and_then(|raw| {
        let days = raw.trim().parse::<u32>().ok().filter(|d| is_valid_posted_period(*d));
        if days.is_none() && !raw.trim().is_empty() {
            debug!(key = KEY_POSTED_PERIOD, value = %raw, "Ignoring malformed URL parameter");
        }
        days
    });

    state.salary_min = number_param(&params, KEY_MIN_SALARY).unwrap_or(0);
    state.salary_max = number_param(&params, KEY_MAX_SALARY).unwrap_or(0);
    let has_bounds = state.salary_min > 0 || state.salary_max > 0;
    state.negotiated = match params.get(KEY_NEGOTIATED) {
        Some(raw) => parse_bool(raw).unwrap_or_else(|| {
            debug!(key = KEY_NEGOTIATED, value = %raw, "Ignoring malformed URL parameter");
            !has_bounds
        }),
        None => !has_bounds,
    };

    state.sort_by = required_enum::<SortBy>(&params, defaults.sort_by);
    state.direction = required_enum::<SortDirection>(&params, defaults.direction);

    state.page = match params.get(KEY_PAGE) {
        Some(_) => number_param::<u32>(&params, KEY_PAGE)
            .filter(|page| *page >= 1)
            .unwrap_or(defaults.page),
        None => number_param::<u32>(&params, KEY_LEGACY_OFFSET)
            .map(|offset| offset.saturating_add(1))
            .unwrap_or(defaults.page),
    };
    let page_size_key = if params.contains_key(KEY_PAGE_SIZE) {
        KEY_PAGE_SIZE
    } else {
        KEY_LEGACY_LIMIT
    };
    state.page_size = number_param::<u32>(&params, page_size_key)
        .filter(|size| is_valid_page_size(*size))
        .unwrap_or(defaults.page_size);

    state.canonicalize()
}

/// Address of the listing page for an encoded query.
pub fn location_for(query: &str) -> String {
    if query.is_empty() {
        LISTING_PATH.to_string()
    } else {
        format!("{}?{}", LISTING_PATH, query)
    }
}

fn optional_enum<T: WireEnum>(params: &HashMap<String, String>) -> Option<T> {
    let raw = params.get(T::FIELD)?;
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = T::parse(raw);
    if parsed.is_none() {
        debug!(key = T::FIELD, value = %raw, "Ignoring malformed URL parameter");
    }
    parsed
}

fn required_enum<T: WireEnum>(params: &HashMap<String, String>, default: T) -> T {
    optional_enum(params).unwrap_or(default)
}

fn number_param<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str) -> Option<T> {
    let raw = params.get(key)?;
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        debug!(key, value = %raw, "Ignoring malformed URL parameter");
    }
    parsed
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// The address bar of one listing page.
pub trait History {
    /// Query string of the current entry, without the leading `?`.
    fn location(&self) -> &str;
    fn push(&mut self, query: String);
    fn replace(&mut self, query: String);
    fn back(&mut self) -> bool;
    fn forward(&mut self) -> bool;
}

/// Entries a [`MemoryHistory`] keeps; older ones fall off the back.
pub const MAX_HISTORY_ENTRIES: usize = 50;

#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![strip_question_mark(initial)],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

fn strip_question_mark(query: &str) -> String {
    query.strip_prefix('?').unwrap_or(query).to_string()
}

impl History for MemoryHistory {
    fn location(&self) -> &str {
        &self.entries[self.cursor]
    }

    fn push(&mut self, query: String) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(strip_question_mark(&query));
        if self.entries.len() > MAX_HISTORY_ENTRIES {
            let overflow = self.entries.len() - MAX_HISTORY_ENTRIES;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len() - 1;
    }

    fn replace(&mut self, query: String) {
        self.entries[self.cursor] = strip_question_mark(&query);
    }

    fn back(&mut self) -> bool {
        if self.can_go_back() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    fn forward(&mut self) -> bool {
        if self.can_go_forward() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }
}

/// Keeps a [`FilterState`] and the address bar in step, one direction at a
/// time: state changes push history entries, location changes are decoded.
#[derive(Debug)]
pub struct UrlSynchronizer<H: History> {
    history: H,
    state: FilterState,
}

impl<H: History> UrlSynchronizer<H> {
    pub fn mount(history: H) -> Self {
        let mut sync = Self {
            history,
            state: FilterState::default(),
        };
        sync.on_location_changed();
        sync
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn location(&self) -> String {
        location_for(self.history.location())
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Applies a setter call. Returns the new location when the address changed.
    pub fn update(&mut self, change: FilterChange) -> Result<Option<String>> {
        let next = self.state.with_change(change)?;
        Ok(self.commit(next))
    }

    pub fn commit(&mut self, next: FilterState) -> Option<String> {
        let next = next.canonicalize();
        if next == self.state {
            return None;
        }
        let encoded = encode(&next);
        self.state = next;
        self.history.push(encoded.clone());
        Some(location_for(&encoded))
    }

    /// Reacts to back/forward or a direct link. Returns the adopted state when
    /// it differs from the current one; the history is only ever rewritten in
    /// place to its canonical spelling.
    pub fn on_location_changed(&mut self) -> Option<FilterState> {
        let raw = self.history.location().to_string();
        let decoded = decode(&raw);
        let canonical = encode(&decoded);
        if canonical != raw {
            debug!(from = %raw, to = %canonical, "Rewriting address to canonical form");
            self.history.replace(canonical);
        }
        if decoded == self.state {
            return None;
        }
        self.state = decoded.clone();
        Some(decoded)
    }
}
