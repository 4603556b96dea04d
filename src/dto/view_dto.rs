use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateViewPayload {
    /// Query string of the address the page was opened on.
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NavigatePayload {
    #[validate(length(max = 2048))]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PagePayload {
    #[validate(range(min = 1))]
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PageSizePayload {
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1))]
    pub token: String,
    #[serde(default)]
    pub user: Option<JsonValue>,
}
