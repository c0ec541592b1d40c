use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Current time, overridable with `FALCON_FIXED_TIME` (RFC 3339) for reproducible reports.
pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var("FALCON_FIXED_TIME") {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}

/// Today as `YYYY-MM-DD`.
pub fn today() -> String {
    now_utc().date_naive().format("%Y-%m-%d").to_string()
}

/// Parse the date formats intelligence sources hand back: RFC 3339,
/// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and WHOIS-style `YYYY-MM-DDTHH:MM:SSZ`.
pub fn parse_loose_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    let head = value.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Whole calendar years between `date` and now; never negative.
pub fn years_since(date: NaiveDate) -> u32 {
    let years = now_utc().year() - date.year();
    years.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 4).unwrap();
        assert_eq!(parse_loose_date("2019-03-04"), Some(expected));
        assert_eq!(parse_loose_date("2019-03-04T10:11:12Z"), Some(expected));
        assert_eq!(parse_loose_date("2019-03-04 10:11:12"), Some(expected));
        assert_eq!(parse_loose_date("2019-03-04T10:11:12+00:00"), Some(expected));
        assert_eq!(parse_loose_date("Unknown"), None);
        assert_eq!(parse_loose_date(""), None);
    }
}
