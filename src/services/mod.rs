pub mod fetch_service;
pub mod job_api_service;
pub mod pagination_service;
pub mod session_service;
pub mod url_sync_service;
pub mod view_service;
