pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{job_api_service::JobApiClient, view_service::ViewRegistry};

#[derive(Clone)]
pub struct AppState {
    pub jobs_api: JobApiClient,
    pub views: Arc<ViewRegistry<JobApiClient>>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let jobs_api = JobApiClient::new(&config.jobs_api_url, config.upstream_timeout())?;
        let views = Arc::new(ViewRegistry::new(jobs_api.clone()));
        Ok(Self { jobs_api, views })
    }
}
