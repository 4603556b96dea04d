use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Numeric and string ids both become strings; a missing or null id is empty.
fn deserialize_id_flexible<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::String(s)) => s,
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Amounts arrive as numbers or numeric strings. Free text such as
/// "Negotiable" means no amount.
fn deserialize_amount_flexible<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A listing as returned by the job API. Only display formatting touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, deserialize_with = "deserialize_id_flexible")]
    pub id: String,
    #[serde(alias = "job_title", default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company_name: String,
    #[serde(default)]
    pub company_image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<JsonValue>,
    #[serde(alias = "min_amount", default, deserialize_with = "deserialize_amount_flexible")]
    pub salary_min: Option<f64>,
    #[serde(alias = "max_amount", default, deserialize_with = "deserialize_amount_flexible")]
    pub salary_max: Option<f64>,
    #[serde(default)]
    pub posted_date: Option<String>,
    #[serde(default)]
    pub deadline_date: Option<String>,
    #[serde(default)]
    pub addresses: Option<JsonValue>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
