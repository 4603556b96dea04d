use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Calendar date of an upstream timestamp, which may be RFC 3339, a naive
/// datetime or a bare `YYYY-MM-DD`.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

/// `DD/MM/YY` for display. Unparseable input renders as an empty string.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() == 8 && NaiveDate::parse_from_str(raw, "%d/%m/%y").is_ok() {
        return raw.to_string();
    }
    parse_loose_date(raw)
        .map(|date| date.format("%d/%m/%y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_dates_render_short() {
        assert_eq!(format_date("2025-03-07"), "07/03/25");
        assert_eq!(format_date("2025-03-07T10:15:00Z"), "07/03/25");
        assert_eq!(format_date("2025-03-07T10:15:00.123"), "07/03/25");
    }

    #[test]
    fn short_dates_pass_through_and_garbage_is_empty() {
        assert_eq!(format_date("07/03/25"), "07/03/25");
        assert_eq!(format_date("yesterday"), "");
        assert_eq!(format_date(""), "");
    }
}
