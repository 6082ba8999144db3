use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Render a frontmatter timestamp for display in local time.
///
/// Accepts RFC 3339 (`2025-01-02T10:30:00Z`), a naive `YYYY-MM-DDTHH:MM:SS`
/// and a bare `YYYY-MM-DD`. Anything else is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}
