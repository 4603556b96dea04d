use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Day windows offered by the "posted within" control.
pub const POSTED_PERIODS: [u32; 5] = [1, 3, 7, 14, 30];

/// An enumeration with a fixed spelling on the wire (URL and upstream API).
pub trait WireEnum: Copy + Sized + 'static {
    const FIELD: &'static str;
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    /// Case-insensitive lookup used for untrusted input.
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.as_str().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkMode {
    Onsite,
    Remote,
    Hybrid,
}

impl WireEnum for WorkMode {
    const FIELD: &'static str = "work_mode";
    const ALL: &'static [Self] = &[Self::Onsite, Self::Remote, Self::Hybrid];

    fn as_str(self) -> &'static str {
        match self {
            WorkMode::Onsite => "ONSITE",
            WorkMode::Remote => "REMOTE",
            WorkMode::Hybrid => "HYBRID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl WireEnum for EmploymentType {
    const FIELD: &'static str = "employment_type";
    const ALL: &'static [Self] = &[
        Self::FullTime,
        Self::PartTime,
        Self::Contract,
        Self::Freelance,
        Self::Internship,
    ];

    fn as_str(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FULL_TIME",
            EmploymentType::PartTime => "PART_TIME",
            EmploymentType::Contract => "CONTRACT",
            EmploymentType::Freelance => "FREELANCE",
            EmploymentType::Internship => "INTERNSHIP",
        }
    }
}

/// Job board a listing was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobSource {
    Vietnamworks,
    Linkedin,
    Jobsgo,
}

impl WireEnum for JobSource {
    const FIELD: &'static str = "source";
    const ALL: &'static [Self] = &[Self::Vietnamworks, Self::Linkedin, Self::Jobsgo];

    fn as_str(self) -> &'static str {
        match self {
            JobSource::Vietnamworks => "VIETNAMWORKS",
            JobSource::Linkedin => "LINKEDIN",
            JobSource::Jobsgo => "JOBSGO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    PostedDate,
    JobTitle,
    CompanyName,
}

impl WireEnum for SortBy {
    const FIELD: &'static str = "sort_by";
    const ALL: &'static [Self] = &[Self::PostedDate, Self::JobTitle, Self::CompanyName];

    fn as_str(self) -> &'static str {
        match self {
            SortBy::PostedDate => "posted_date",
            SortBy::JobTitle => "job_title",
            SortBy::CompanyName => "company_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl WireEnum for SortDirection {
    const FIELD: &'static str = "direction";
    const ALL: &'static [Self] = &[Self::Asc, Self::Desc];

    fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalaryRange {
    pub id: &'static str,
    pub label: &'static str,
    pub min: u64,
    pub max: u64,
    pub negotiated: bool,
}

pub const NEGOTIABLE_RANGE_ID: &str = "negotiable";

pub const SALARY_RANGES: [SalaryRange; 7] = [
    SalaryRange {
        id: "0-2000",
        label: "$0 - $2000",
        min: 0,
        max: 2000,
        negotiated: false,
    },
    SalaryRange {
        id: "2000-5000",
        label: "$2000 - $5000",
        min: 2000,
        max: 5000,
        negotiated: false,
    },
    SalaryRange {
        id: "5000-10000",
        label: "$5000 - $10000",
        min: 5000,
        max: 10000,
        negotiated: false,
    },
    SalaryRange {
        id: "10000-15000",
        label: "$10000 - $15000",
        min: 10000,
        max: 15000,
        negotiated: false,
    },
    SalaryRange {
        id: "15000-20000",
        label: "$15000 - $20000",
        min: 15000,
        max: 20000,
        negotiated: false,
    },
    SalaryRange {
        id: "20000+",
        label: "Above $20000",
        min: 20000,
        max: 100000,
        negotiated: false,
    },
    SalaryRange {
        id: NEGOTIABLE_RANGE_ID,
        label: "Negotiable",
        min: 0,
        max: 0,
        negotiated: true,
    },
];

pub fn find_salary_range(id: &str) -> Option<&'static SalaryRange> {
    SALARY_RANGES.iter().find(|range| range.id == id.trim())
}

/// Everything the listing is currently searching for. Only the URL carries it
/// between page loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub query: String,
    pub city: String,
    pub work_mode: Option<WorkMode>,
    pub employment_type: Option<EmploymentType>,
    pub source: Option<JobSource>,
    pub posted_period: Option<u32>,
    pub salary_min: u64,
    pub salary_max: u64,
    pub negotiated: bool,
    pub sort_by: SortBy,
    pub direction: SortDirection,
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            city: String::new(),
            work_mode: None,
            employment_type: None,
            source: None,
            posted_period: None,
            salary_min: 0,
            salary_max: 0,
            negotiated: true,
            sort_by: SortBy::PostedDate,
            direction: SortDirection::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A single setter call coming from the filter form or the pagination control.
///
/// Enumerated values arrive as raw strings so that unknown spellings can be
/// reported as [`Error::InvalidSelection`] instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FilterChange {
    Query(String),
    City(String),
    WorkMode(Option<String>),
    EmploymentType(Option<String>),
    Source(Option<String>),
    PostedPeriod(Option<u32>),
    SalaryRange(String),
    SalaryBounds { min: u64, max: u64 },
    SortBy(String),
    Direction(String),
    Page(u32),
    PageSize(u32),
}

impl FilterChange {
    pub fn is_pagination(&self) -> bool {
        matches!(self, FilterChange::Page(_) | FilterChange::PageSize(_))
    }
}

/// Maps the "All City" sentinel, in any casing or URL spelling, to no city.
pub fn normalize_city(raw: &str) -> String {
    let trimmed = raw.trim();
    let spelled_out = trimmed.replace("%20", " ").replace('+', " ");
    let collapsed = spelled_out.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.eq_ignore_ascii_case("all city") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

pub fn is_valid_page_size(page_size: u32) -> bool {
    (1..=MAX_PAGE_SIZE).contains(&page_size)
}

pub fn is_valid_posted_period(days: u32) -> bool {
    POSTED_PERIODS.contains(&days)
}

fn parse_optional<T: WireEnum>(raw: Option<String>) -> Result<Option<T>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => T::parse(value)
            .map(Some)
            .ok_or_else(|| Error::invalid_selection(T::FIELD, value)),
    }
}

fn parse_required<T: WireEnum>(raw: &str) -> Result<T> {
    T::parse(raw).ok_or_else(|| Error::invalid_selection(T::FIELD, raw))
}

impl FilterState {
    pub fn reset_page(&self) -> FilterState {
        FilterState {
            page: 1,
            ..self.clone()
        }
    }

    pub fn apply_salary_selection(&self, range_id: &str) -> Result<FilterState> {
        let range = find_salary_range(range_id)
            .ok_or_else(|| Error::invalid_selection("salary_range", range_id))?;

        let mut next = self.clone();
        if range.negotiated {
            next.salary_min = 0;
            next.salary_max = 0;
            next.negotiated = true;
        } else {
            next.salary_min = range.min;
            next.salary_max = range.max;
            next.negotiated = false;
        }
        Ok(next)
    }

    /// Custom bounds typed into the numeric inputs. `0/0` means negotiable.
    pub fn with_salary_bounds(&self, min: u64, max: u64) -> Result<FilterState> {
        if max > 0 && min > max {
            return Err(Error::InvalidSelection(format!(
                "salary minimum {} exceeds maximum {}",
                min, max
            )));
        }

        let mut next = self.clone();
        next.salary_min = min;
        next.salary_max = max;
        next.negotiated = min == 0 && max == 0;
        Ok(next)
    }

    /// The preset range matching the current salary bounds, if any.
    pub fn matching_salary_range(&self) -> Option<&'static SalaryRange> {
        if self.negotiated {
            return find_salary_range(NEGOTIABLE_RANGE_ID);
        }
        SALARY_RANGES
            .iter()
            .filter(|range| !range.negotiated)
            .find(|range| range.min == self.salary_min && range.max == self.salary_max)
    }

    pub fn with_change(&self, change: FilterChange) -> Result<FilterState> {
        let resets_page = !change.is_pagination();
        let mut next = self.clone();

        match change {
            FilterChange::Query(query) => next.query = query.trim().to_string(),
            FilterChange::City(city) => next.city = normalize_city(&city),
            FilterChange::WorkMode(value) => next.work_mode = parse_optional(value)?,
            FilterChange::EmploymentType(value) => next.employment_type = parse_optional(value)?,
            FilterChange::Source(value) => next.source = parse_optional(value)?,
            FilterChange::PostedPeriod(days) => {
                next.posted_period = match days {
                    None | Some(0) => None,
                    Some(days) if is_valid_posted_period(days) => Some(days),
                    Some(days) => return Err(Error::invalid_selection("posted_period", days)),
                }
            }
            FilterChange::SalaryRange(range_id) => next = next.apply_salary_selection(&range_id)?,
            FilterChange::SalaryBounds { min, max } => next = next.with_salary_bounds(min, max)?,
            FilterChange::SortBy(value) => next.sort_by = parse_required(&value)?,
            FilterChange::Direction(value) => next.direction = parse_required(&value)?,
            FilterChange::Page(page) => {
                if page == 0 {
                    return Err(Error::invalid_selection("page", page));
                }
                next.page = page;
            }
            FilterChange::PageSize(page_size) => {
                if !is_valid_page_size(page_size) {
                    return Err(Error::invalid_selection("page_size", page_size));
                }
                next.page_size = page_size;
            }
        }

        if resets_page && next != *self {
            next = next.reset_page();
        }
        Ok(next)
    }

    /// Repairs anything a hand-built state could get wrong.
    pub fn canonicalize(mut self) -> FilterState {
        self.query = self.query.trim().to_string();
        self.city = normalize_city(&self.city);

        if self.posted_period.is_some_and(|days| !is_valid_posted_period(days)) {
            self.posted_period = None;
        }

        if self.negotiated {
            self.salary_min = 0;
            self.salary_max = 0;
        } else if self.salary_min == 0 && self.salary_max == 0 {
            self.negotiated = true;
        } else if self.salary_max > 0 && self.salary_min > self.salary_max {
            std::mem::swap(&mut self.salary_min, &mut self.salary_max);
        }

        if self.page == 0 {
            self.page = 1;
        }
        if !is_valid_page_size(self.page_size) {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self
    }

    pub fn is_canonical(&self) -> bool {
        self.clone().canonicalize() == *self
    }

    /// Zero-based page index sent upstream as `offset`.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_the_documented_baseline() {
        let state = FilterState::default();
        assert_eq!(state.query, "");
        assert_eq!(state.city, "");
        assert_eq!(state.work_mode, None);
        assert_eq!(state.sort_by, SortBy::PostedDate);
        assert_eq!(state.direction, SortDirection::Desc);
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size, 10);
        assert!(state.negotiated);
        assert!(state.is_canonical());
    }

    #[test]
    fn all_city_spellings_normalize_to_empty() {
        for raw in ["All City", "All+City", "all city", "ALL%20CITY", "  All   City "] {
            assert_eq!(normalize_city(raw), "", "{raw}");
        }
        assert_eq!(normalize_city(" Da Nang "), "Da Nang");
    }

    #[test]
    fn normalize_city_is_idempotent() {
        for raw in ["All City", "All+City", "Hue", " Ho Chi Minh ", "", "All Cities"] {
            let once = normalize_city(raw);
            assert_eq!(normalize_city(&once), once);
        }
    }

    #[test]
    fn negotiable_selection_zeroes_bounds() {
        let state = FilterState::default()
            .apply_salary_selection("2000-5000")
            .unwrap()
            .apply_salary_selection("negotiable")
            .unwrap();
        assert_eq!((state.salary_min, state.salary_max, state.negotiated), (0, 0, true));
    }

    #[test]
    fn concrete_selection_clears_negotiated() {
        let state = FilterState::default().apply_salary_selection("20000+").unwrap();
        assert_eq!((state.salary_min, state.salary_max, state.negotiated), (20000, 100000, false));
        assert_eq!(state.matching_salary_range().map(|r| r.id), Some("20000+"));
    }

    #[test]
    fn unknown_salary_range_is_invalid_selection() {
        let err = FilterState::default().apply_salary_selection("1-2").unwrap_err();
        assert!(matches!(err, Error::InvalidSelection(_)));
    }

    #[test]
    fn filter_change_resets_page() {
        let on_page_four = FilterState {
            page: 4,
            ..FilterState::default()
        };
        let changes = [
            FilterChange::Query("rust".into()),
            FilterChange::City("Hue".into()),
            FilterChange::WorkMode(Some("remote".into())),
            FilterChange::EmploymentType(Some("FULL_TIME".into())),
            FilterChange::Source(Some("LinkedIn".into())),
            FilterChange::PostedPeriod(Some(7)),
            FilterChange::SalaryRange("5000-10000".into()),
            FilterChange::SortBy("job_title".into()),
            FilterChange::Direction("asc".into()),
        ];
        for change in changes {
            let next = on_page_four.with_change(change.clone()).unwrap();
            assert_eq!(next.page, 1, "{change:?}");
        }
    }

    #[test]
    fn pagination_change_keeps_filters_and_page() {
        let state = FilterState::default()
            .with_change(FilterChange::City("Hue".into()))
            .unwrap()
            .with_change(FilterChange::Page(3))
            .unwrap();
        assert_eq!(state.page, 3);
        let resized = state.with_change(FilterChange::PageSize(20)).unwrap();
        assert_eq!((resized.page, resized.page_size, resized.city.as_str()), (3, 20, "Hue"));
    }

    #[test]
    fn unchanged_filter_keeps_page() {
        let state = FilterState {
            page: 2,
            city: "Hue".into(),
            ..FilterState::default()
        };
        let next = state.with_change(FilterChange::City("Hue".into())).unwrap();
        assert_eq!(next.page, 2);
    }

    #[test]
    fn invalid_setter_values_are_rejected() {
        let state = FilterState::default();
        assert!(state.with_change(FilterChange::WorkMode(Some("office".into()))).is_err());
        assert!(state.with_change(FilterChange::PostedPeriod(Some(5))).is_err());
        assert!(state.with_change(FilterChange::Page(0)).is_err());
        assert!(state.with_change(FilterChange::PageSize(500)).is_err());
        assert!(state
            .with_change(FilterChange::SalaryBounds { min: 900, max: 100 })
            .is_err());
    }

    #[test]
    fn clearing_an_enum_field_accepts_empty_string() {
        let state = FilterState {
            work_mode: Some(WorkMode::Hybrid),
            ..FilterState::default()
        };
        let next = state.with_change(FilterChange::WorkMode(Some(String::new()))).unwrap();
        assert_eq!(next.work_mode, None);
    }

    #[test]
    fn canonicalize_repairs_salary_invariant() {
        let zero_bounds = FilterState {
            negotiated: false,
            ..FilterState::default()
        };
        assert!(zero_bounds.canonicalize().negotiated);

        let negotiated_with_bounds = FilterState {
            salary_min: 10,
            salary_max: 20,
            ..FilterState::default()
        };
        let repaired = negotiated_with_bounds.canonicalize();
        assert_eq!((repaired.salary_min, repaired.salary_max), (0, 0));

        let swapped = FilterState {
            negotiated: false,
            salary_min: 5000,
            salary_max: 2000,
            ..FilterState::default()
        }
        .canonicalize();
        assert_eq!((swapped.salary_min, swapped.salary_max), (2000, 5000));
    }

    #[test]
    fn change_deserializes_from_tagged_json() {
        let change: FilterChange =
            serde_json::from_str(r#"{"field":"salary_bounds","value":{"min":1000,"max":3000}}"#).unwrap();
        assert_eq!(change, FilterChange::SalaryBounds { min: 1000, max: 3000 });

        let change: FilterChange = serde_json::from_str(r#"{"field":"city","value":"Da Nang"}"#).unwrap();
        assert_eq!(change, FilterChange::City("Da Nang".into()));
    }
}
