use std::future::Future;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::Client;
use tracing::{instrument, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::models::filter::{FilterState, WireEnum};
use crate::models::listing::ListingResponse;

/// Parameters of one request to the job listing endpoint, in the order they
/// are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pairs: Vec<(&'static str, String)>,
}

impl ListingQuery {
    pub fn from_filter(filter: &FilterState, today: NaiveDate) -> Self {
        let mut pairs = Vec::new();

        if !filter.query.is_empty() {
            pairs.push(("query", filter.query.clone()));
        }
        if !filter.city.is_empty() {
            pairs.push(("city", filter.city.clone()));
        }
        if let Some(work_mode) = filter.work_mode {
            pairs.push(("work_mode", work_mode.as_str().to_string()));
        }
        if let Some(employment_type) = filter.employment_type {
            pairs.push(("employment_type", employment_type.as_str().to_string()));
        }
        if let Some(source) = filter.source {
            pairs.push(("source", source.as_str().to_string()));
        }
        pairs.push(("sort_by", filter.sort_by.as_str().to_string()));
        pairs.push(("direction", filter.direction.as_str().to_string()));
        pairs.push(("negotiated", filter.negotiated.to_string()));
        if !filter.negotiated {
            if filter.salary_min > 0 {
                pairs.push(("min_salary", filter.salary_min.to_string()));
            }
            if filter.salary_max > 0 {
                pairs.push(("max_salary", filter.salary_max.to_string()));
            }
        }
        if let Some(days) = filter.posted_period {
            let from = today - ChronoDuration::days(i64::from(days));
            pairs.push(("posted_date_from", from.format("%Y-%m-%d").to_string()));
        }
        pairs.push(("limit", filter.page_size.to_string()));
        pairs.push(("offset", filter.offset().to_string()));

        Self { pairs }
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Anything that can serve a page of job listings.
pub trait ListingSource: Send + Sync + 'static {
    fn fetch_listing(
        &self,
        query: &ListingQuery,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<ListingResponse>> + Send;
}

#[derive(Clone)]
pub struct JobApiClient {
    client: Client,
    endpoint: Url,
}

impl JobApiClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn request_url(&self, query: &ListingQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(query.pairs().iter().map(|(k, v)| (*k, v.as_str())));
        url
    }
}

impl ListingSource for JobApiClient {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn fetch_listing(
        &self,
        query: &ListingQuery,
        bearer: Option<&str>,
    ) -> Result<ListingResponse> {
        let url = self.request_url(query);
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            warn!(status = status.as_u16(), %message, "Job listing request failed");
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ListingResponse>().await?)
    }
}

fn upstream_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
