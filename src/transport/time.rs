//! Time bounds for history windows

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::output::Failure;

/// Unix seconds from unix seconds, RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD` (UTC)
pub fn parse_timestamp(value: &str) -> Result<i64, Failure> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<i64>() {
        return Ok(secs);
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.timestamp());
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(time.and_utc().timestamp());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc().timestamp());
    }
    Err(
        Failure::invalid("invalid_timestamp", format!("invalid timestamp format: {}", value))
            .with_suggestion("Use unix seconds or ISO 8601 (2024-01-25 or 2024-01-25T10:00:00Z)"),
    )
}

/// Optional bound; empty means unbounded
pub fn parse_bound(value: Option<&str>) -> Result<Option<i64>, Failure> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_timestamp(value).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(parse_timestamp("1706123456").unwrap(), 1706123456);
        assert_eq!(parse_timestamp("2024-01-25").unwrap(), 1706140800);
        assert_eq!(parse_timestamp("2024-01-25T01:00:00").unwrap(), 1706144400);
        assert_eq!(parse_timestamp("2024-01-25T01:00:00Z").unwrap(), 1706144400);
        assert_eq!(parse_timestamp("2024-01-25T03:00:00+02:00").unwrap(), 1706144400);
    }

    #[test]
    fn test_invalid() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert_eq!(err.code, "invalid_timestamp");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(parse_bound(Some("  ")).unwrap(), None);
        assert_eq!(parse_bound(None).unwrap(), None);
    }
}
