use serde::Serialize;
use serde_json::Value as JsonValue;

pub const MAX_TAG_LENGTH: usize = 20;
pub const VISIBLE_TAGS: usize = 2;

const REMOTE: &str = "Remote";

/// One decimal at most, dropped when it is zero.
fn one_decimal(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

pub fn format_amount(amount: f64) -> String {
    if amount >= 1_000_000_000.0 {
        format!("{}B", one_decimal(amount / 1_000_000_000.0))
    } else if amount >= 1_000_000.0 {
        format!("{}M", one_decimal(amount / 1_000_000.0))
    } else if amount >= 1_000.0 {
        format!("{}K", one_decimal(amount / 1_000.0))
    } else {
        format!("{}", amount.round() as i64)
    }
}

pub fn format_salary_range(min: Option<f64>, max: Option<f64>) -> String {
    let min = min.filter(|v| *v > 0.0);
    let max = max.filter(|v| *v > 0.0);
    match (min, max) {
        (None, None) => "Negotiable".to_string(),
        (Some(min), None) => format!("${}", format_amount(min)),
        (Some(min), Some(max)) if min == max => format!("${}", format_amount(min)),
        (min, Some(max)) => format!(
            "${} - ${}",
            format_amount(min.unwrap_or(0.0)),
            format_amount(max)
        ),
    }
}

fn non_empty_str<'a>(value: &'a JsonValue, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn address_of_object(value: &JsonValue) -> Option<String> {
    if let Some(full) = non_empty_str(value, "full_address") {
        return Some(full.to_string());
    }
    match (non_empty_str(value, "city"), non_empty_str(value, "country")) {
        (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
        (Some(city), None) => Some(city.to_string()),
        (None, Some(country)) => Some(country.to_string()),
        (None, None) => non_empty_str(value, "address").map(str::to_string),
    }
}

/// Single display line for the loosely shaped `addresses` field.
pub fn format_address(addresses: Option<&JsonValue>) -> String {
    let address = match addresses {
        Some(JsonValue::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(JsonValue::Array(items)) => match items.first() {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(first @ JsonValue::Object(_)) => address_of_object(first),
            _ => None,
        },
        Some(object @ JsonValue::Object(_)) => address_of_object(object),
        _ => None,
    };
    address.unwrap_or_else(|| REMOTE.to_string())
}

fn tag_text(tag: &JsonValue) -> String {
    match tag {
        JsonValue::String(s) => s.clone(),
        JsonValue::Object(_) => ["name", "label", "text", "value"]
            .iter()
            .find_map(|key| non_empty_str(tag, key))
            .unwrap_or_default()
            .to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn sanitize_tag(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '.' | ','))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagView {
    pub text: String,
    /// Untruncated text, present only when `text` was shortened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

/// The tags shown on a job card: the first few, cleaned up, empty ones dropped.
pub fn display_tags(tags: &[JsonValue]) -> Vec<TagView> {
    tags.iter()
        .take(VISIBLE_TAGS)
        .map(|tag| sanitize_tag(&tag_text(tag)))
        .filter(|text| !text.is_empty())
        .map(|text| {
            let shown = truncate(&text, MAX_TAG_LENGTH);
            TagView {
                full_text: (shown != text).then_some(text),
                text: shown,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn salary_ranges() {
        assert_eq!(format_salary_range(None, None), "Negotiable");
        assert_eq!(format_salary_range(Some(0.0), Some(0.0)), "Negotiable");
        assert_eq!(format_salary_range(Some(1500.0), None), "$1.5K");
        assert_eq!(format_salary_range(Some(2000.0), Some(2000.0)), "$2K");
        assert_eq!(format_salary_range(Some(1000.0), Some(2500.0)), "$1K - $2.5K");
        assert_eq!(format_salary_range(None, Some(5000.0)), "$0 - $5K");
        assert_eq!(format_salary_range(Some(15_000_000.0), Some(2_000_000_000.0)), "$15M - $2B");
        assert_eq!(format_salary_range(Some(800.0), None), "$800");
    }

    #[test]
    fn addresses_in_every_shape() {
        assert_eq!(format_address(None), "Remote");
        assert_eq!(format_address(Some(&json!("Hanoi"))), "Hanoi");
        assert_eq!(format_address(Some(&json!([]))), "Remote");
        assert_eq!(format_address(Some(&json!(["Hue", "Hanoi"]))), "Hue");
        assert_eq!(
            format_address(Some(&json!([{"city": "Da Nang", "country": "Vietnam"}]))),
            "Da Nang, Vietnam"
        );
        assert_eq!(
            format_address(Some(&json!({"full_address": "1 Le Loi, Hue", "city": "Hue"}))),
            "1 Le Loi, Hue"
        );
        assert_eq!(format_address(Some(&json!({"country": "Vietnam"}))), "Vietnam");
        assert_eq!(format_address(Some(&json!({"zip": "70000"}))), "Remote");
    }

    #[test]
    fn tags_are_sanitized_and_truncated() {
        let tags = vec![
            json!({"name": "<b>Rust</b>!"}),
            json!("Distributed Systems Engineering"),
            json!("Third"),
        ];
        let shown = display_tags(&tags);
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].text, "bRustb");
        assert_eq!(shown[0].full_text, None);
        assert_eq!(shown[1].text, "Distributed Systems ...");
        assert_eq!(shown[1].full_text.as_deref(), Some("Distributed Systems Engineering"));
    }

    #[test]
    fn empty_tags_are_dropped() {
        assert!(display_tags(&[json!("***"), json!({"id": 3})]).is_empty());
        assert_eq!(display_tags(&[json!(42)])[0].text, "42");
    }
}
