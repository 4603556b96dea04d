use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::models::job::Job;

/// Keeps the items that read as a [`Job`] and drops the rest, so one bad
/// record does not cost the whole page.
fn lenient_items<'de, D>(deserializer: D) -> std::result::Result<Vec<Job>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<JsonValue>::deserialize(deserializer)?;
    let received = values.len();
    let jobs: Vec<Job> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable job in listing response");
                None
            }
        })
        .collect();
    if jobs.len() < received {
        warn!(received, kept = jobs.len(), "Listing response had unreadable jobs");
    }
    Ok(jobs)
}

/// Body of a job listing response. `V1` is the documented shape; the other two
/// are older shapes still produced by some deployments.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListingResponse {
    V1 {
        #[serde(deserialize_with = "lenient_items")]
        items: Vec<Job>,
        #[serde(default)]
        total_count: Option<u64>,
    },
    Data {
        #[serde(deserialize_with = "lenient_items")]
        data: Vec<Job>,
        #[serde(default)]
        total_count: Option<u64>,
    },
    Bare(#[serde(deserialize_with = "lenient_items")] Vec<Job>),
}

impl ListingResponse {
    pub fn into_parts(self) -> (Vec<Job>, Option<u64>) {
        match self {
            ListingResponse::V1 { items, total_count } => (items, total_count),
            ListingResponse::Data { data, total_count } => (data, total_count),
            ListingResponse::Bare(items) => (items, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub items: Vec<Job>,
    pub total_count: u64,
    pub request_epoch: u64,
}

impl ListingPage {
    pub fn empty(request_epoch: u64) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            request_epoch,
        }
    }

    pub fn from_response(response: ListingResponse, request_epoch: u64) -> Self {
        let (items, total_count) = response.into_parts();
        let total_count = match total_count {
            Some(total) if total > 0 || items.is_empty() => total,
            _ => items.len() as u64,
        };
        Self {
            items,
            total_count,
            request_epoch,
        }
    }
}
