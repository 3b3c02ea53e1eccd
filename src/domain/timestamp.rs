use time::macros::{date, format_description, time};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Export timestamps are local wall-clock strings without an offset.
pub type Timestamp = PrimitiveDateTime;

const SECONDS_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const MINUTES_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Parses `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`, each tried
/// against the prefix of matching length so trailing text is ignored.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Some(prefix) = raw.get(..19) {
        if let Ok(ts) = PrimitiveDateTime::parse(prefix, SECONDS_FORMAT) {
            return Some(ts);
        }
    }
    if let Some(prefix) = raw.get(..16) {
        if let Ok(ts) = PrimitiveDateTime::parse(prefix, MINUTES_FORMAT) {
            return Some(ts);
        }
    }
    let prefix = raw.get(..10)?;
    time::Date::parse(prefix, DATE_FORMAT)
        .ok()
        .map(|day| day.with_time(time::Time::MIDNIGHT))
}

/// Sort key where unparsable timestamps order before every real one.
pub fn sort_key(raw: &str) -> Timestamp {
    parse_timestamp(raw).unwrap_or(PrimitiveDateTime::MIN)
}

pub fn format_minutes(ts: Timestamp) -> String {
    ts.format(MINUTES_FORMAT).unwrap_or_default()
}

pub fn format_date(ts: Timestamp) -> String {
    ts.format(DATE_FORMAT).unwrap_or_default()
}

/// `ts` moved back by `days` whole days; `None` when the day count or the
/// result falls outside the representable range.
pub fn days_before(ts: Timestamp, days: i64) -> Option<Timestamp> {
    let seconds = days.checked_mul(86_400)?;
    ts.checked_sub(Duration::seconds(seconds))
}

pub fn now_local() -> Timestamp {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Converts a Core Data timestamp (seconds since 2001-01-01 00:00:00) to a
/// wall-clock timestamp.
pub fn from_core_data(seconds: f64) -> Timestamp {
    core_data_epoch() + Duration::seconds_f64(seconds)
}

pub fn to_core_data(ts: Timestamp) -> f64 {
    (ts - core_data_epoch()).as_seconds_f64()
}

fn core_data_epoch() -> Timestamp {
    PrimitiveDateTime::new(date!(2001 - 01 - 01), time!(0:00))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_supported_precision() {
        let full = parse_timestamp("2025-01-05 09:30:15").expect("seconds should parse");
        assert_eq!(full.second(), 15);
        let minutes = parse_timestamp("2025-01-05 09:30").expect("minutes should parse");
        assert_eq!(minutes.minute(), 30);
        let day = parse_timestamp("2025-01-05").expect("date should parse");
        assert_eq!(day.hour(), 0);
        assert!(parse_timestamp("2025-01-05 09:30:15 trailing").is_some());
    }

    #[test]
    fn days_before_is_checked() {
        let now = parse_timestamp("2025-01-06 08:00").expect("fixture should parse");
        assert_eq!(
            days_before(now, 5).map(format_minutes).as_deref(),
            Some("2025-01-01 08:00")
        );
        assert!(days_before(now, i64::MAX).is_none());
        assert!(days_before(now, i64::from(u32::MAX)).is_none());
    }

    #[test]
    fn rejects_garbage_and_sorts_it_first() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(sort_key("not a date") < sort_key("1970-01-01"));
    }

    #[test]
    fn core_data_round_trips_through_epoch() {
        let ts = parse_timestamp("2024-06-01 12:00:00").expect("timestamp should parse");
        let seconds = to_core_data(ts);
        assert_eq!(from_core_data(seconds), ts);
        assert_eq!(format_minutes(from_core_data(0.0)), "2001-01-01 00:00");
    }

    #[test]
    fn formats_date_and_minutes() {
        let ts = parse_timestamp("2025-12-10 08:05:59").expect("timestamp should parse");
        assert_eq!(format_date(ts), "2025-12-10");
        assert_eq!(format_minutes(ts), "2025-12-10 08:05");
    }
}
