use serde::Serialize;
use uuid::Uuid;

use crate::models::filter::FilterState;
use crate::models::job::Job;
use crate::services::fetch_service::{FetchSnapshot, FetchStatus};
use crate::services::pagination_service::PaginationModel;
use crate::services::session_service::Session;
use crate::services::view_service::ViewSnapshot;
use crate::utils::format::{display_tags, format_address, format_salary_range, TagView};
use crate::utils::time::format_date;

/// A job as the listing card renders it.
#[derive(Debug, Clone, Serialize)]
pub struct JobCardView {
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub company_image_url: Option<String>,
    pub location: String,
    pub salary: String,
    pub tags: Vec<TagView>,
    pub posted_date: String,
    pub deadline_date: String,
    pub source: Option<String>,
    pub status: Option<String>,
}

impl From<&Job> for JobCardView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            company_name: job.company_name.clone(),
            company_image_url: job.company_image_url.clone(),
            location: format_address(job.addresses.as_ref()),
            salary: format_salary_range(job.salary_min, job.salary_max),
            tags: display_tags(&job.tags),
            posted_date: job.posted_date.as_deref().map(format_date).unwrap_or_default(),
            deadline_date: job.deadline_date.as_deref().map(format_date).unwrap_or_default(),
            source: job.source.clone(),
            status: job.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingViewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_id: Option<Uuid>,
    pub location: String,
    pub filter: FilterState,
    /// Preset salary range matching the filter, if any.
    pub salary_range: Option<&'static str>,
    pub status: FetchStatus,
    pub error: Option<String>,
    pub total_count: u64,
    pub items: Vec<JobCardView>,
    pub pagination: PaginationModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl ListingViewResponse {
    pub fn from_fetch(location: String, filter: FilterState, fetch: &FetchSnapshot) -> Self {
        let pagination =
            PaginationModel::new(filter.page, filter.page_size, fetch.listing.total_count);
        Self {
            view_id: None,
            location,
            salary_range: filter.matching_salary_range().map(|range| range.id),
            filter,
            status: fetch.status,
            error: fetch.error.clone(),
            total_count: fetch.listing.total_count,
            items: fetch.listing.items.iter().map(JobCardView::from).collect(),
            pagination,
            session: None,
        }
    }
}

impl From<ViewSnapshot> for ListingViewResponse {
    fn from(snapshot: ViewSnapshot) -> Self {
        let mut response = Self::from_fetch(snapshot.location, snapshot.filter, &snapshot.fetch);
        response.view_id = Some(snapshot.id);
        response.pagination = snapshot.pagination;
        response.session = snapshot.session;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_card_uses_display_formats() {
        let job: Job = serde_json::from_value(json!({
            "id": 12,
            "job_title": "Backend Engineer",
            "company_name": "Acme",
            "min_amount": 1500,
            "max_amount": "3000",
            "posted_date": "2025-04-02T08:00:00Z",
            "addresses": [{"city": "Hue", "country": "Vietnam"}],
            "tags": ["Rust", {"label": "Postgres"}, "Kafka"]
        }))
        .unwrap();

        let card = JobCardView::from(&job);
        assert_eq!(card.id, "12");
        assert_eq!(card.salary, "$1.5K - $3K");
        assert_eq!(card.location, "Hue, Vietnam");
        assert_eq!(card.posted_date, "02/04/25");
        assert_eq!(card.deadline_date, "");
        assert_eq!(card.tags.len(), 2);
    }
}
