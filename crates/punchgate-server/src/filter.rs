//! Attendance log filtering.
//!
//! `/logs` always fetches the complete attendance table and narrows it in
//! memory. Query dates are parsed before the device is contacted so a bad
//! request never opens a session.
//!
//! Bounds are inclusive and compared against the device's wall-clock time.
//! A bound given as a bare date means midnight at the start of that day,
//! for both `from` and `to`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::error::{GatewayError, GatewayResult};
use punchgate_core::LogRecord;

/// Date-time layouts accepted after RFC 3339.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Date layouts accepted; the first one is the documented form.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Raw `/logs` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub user_id: Option<String>,
}

/// Validated filter over attendance records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub user_id: Option<String>,
}

impl LogFilter {
    /// Validate a query. Empty parameters count as absent; whitespace does
    /// not, so `from=%20` is an invalid date.
    pub fn from_query(query: &LogQuery) -> GatewayResult<Self> {
        Ok(Self {
            from: parse_bound(query.from.as_deref())?,
            to: parse_bound(query.to.as_deref())?,
            user_id: present(query.user_id.as_deref()).map(str::to_string),
        })
    }

    /// Whether a record passes every given criterion.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.from.is_none_or(|from| record.record_time >= from)
            && self.to.is_none_or(|to| record.record_time <= to)
            && self
                .user_id
                .as_deref()
                .is_none_or(|id| record.device_user_id.matches(id))
    }

    /// Keep matching records, preserving device order.
    pub fn apply(&self, mut records: Vec<LogRecord>) -> Vec<LogRecord> {
        records.retain(|record| self.matches(record));
        records
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_bound(value: Option<&str>) -> GatewayResult<Option<NaiveDateTime>> {
    match present(value) {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| GatewayError::invalid_date(raw)),
    }
}

/// Parse a query date.
///
/// Accepts `MM/DD/YYYY`, `YYYY-MM-DD`, `YYYY/MM/DD`,
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]` and
/// RFC 3339. An RFC 3339 offset is dropped; the wall-clock part is used
/// as-is since device times carry no zone.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn query(from: Option<&str>, to: Option<&str>, user_id: Option<&str>) -> LogQuery {
        LogQuery {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            user_id: user_id.map(str::to_string),
        }
    }

    #[rstest]
    #[case("01/15/2024", at(2024, 1, 15, 0, 0))]
    #[case("1/5/2024", at(2024, 1, 5, 0, 0))]
    #[case("2024-01-15", at(2024, 1, 15, 0, 0))]
    #[case("2024/01/15", at(2024, 1, 15, 0, 0))]
    #[case("2024-01-15T08:30", at(2024, 1, 15, 8, 30))]
    #[case("2024-01-15T08:30:00", at(2024, 1, 15, 8, 30))]
    #[case("2024-01-15 08:30:00", at(2024, 1, 15, 8, 30))]
    #[case("2024-01-15T08:30:00Z", at(2024, 1, 15, 8, 30))]
    #[case("2024-01-15T08:30:00-03:00", at(2024, 1, 15, 8, 30))]
    fn test_parse_accepted_formats(#[case] input: &str, #[case] expected: NaiveDateTime) {
        assert_eq!(parse_date(input), Some(expected));
    }

    #[rstest]
    #[case("13/45/2024")]
    #[case("02/30/2024")]
    #[case("2024-13-01")]
    #[case("yesterday")]
    #[case(" ")]
    #[case("2024/02/30")]
    fn test_parse_rejected_formats(#[case] input: &str) {
        assert_eq!(parse_date(input), None);
    }

    #[test]
    fn test_invalid_bound_is_rejected() {
        let result = LogFilter::from_query(&query(Some("13/45/2024"), None, None));
        assert!(matches!(result, Err(GatewayError::InvalidDate { .. })));

        let result = LogFilter::from_query(&query(None, Some("nope"), None));
        assert!(matches!(result, Err(GatewayError::InvalidDate { .. })));
    }

    #[test]
    fn test_empty_parameters_are_absent() {
        let filter = LogFilter::from_query(&query(Some(""), Some(""), Some(""))).unwrap();
        assert_eq!(filter, LogFilter::default());
    }

    #[test]
    fn test_whitespace_bound_is_invalid() {
        let result = LogFilter::from_query(&query(Some(" "), None, None));
        assert!(matches!(result, Err(GatewayError::InvalidDate { .. })));

        let result = LogFilter::from_query(&query(None, Some("\t"), None));
        assert!(matches!(result, Err(GatewayError::InvalidDate { .. })));
    }

    #[test]
    fn test_range_is_inclusive() {
        let filter = LogFilter {
            from: Some(at(2024, 1, 10, 0, 0)),
            to: Some(at(2024, 1, 31, 0, 0)),
            user_id: None,
        };

        assert!(filter.matches(&LogRecord::new("1", at(2024, 1, 10, 0, 0))));
        assert!(filter.matches(&LogRecord::new("1", at(2024, 1, 31, 0, 0))));
        assert!(!filter.matches(&LogRecord::new("1", at(2024, 1, 9, 23, 59))));
        // A bare `to` date is midnight, so punches later that day fall outside.
        assert!(!filter.matches(&LogRecord::new("1", at(2024, 1, 31, 8, 0))));
    }

    #[test]
    fn test_user_id_compared_as_string() {
        let filter = LogFilter {
            user_id: Some("7".to_string()),
            ..LogFilter::default()
        };

        assert!(filter.matches(&LogRecord::new("7", at(2024, 1, 1, 9, 0))));
        assert!(filter.matches(&LogRecord::new(7u64, at(2024, 1, 1, 9, 0))));
        assert!(!filter.matches(&LogRecord::new("07", at(2024, 1, 1, 9, 0))));
        assert!(!filter.matches(&LogRecord::new("17", at(2024, 1, 1, 9, 0))));
    }

    #[test]
    fn test_apply_preserves_device_order() {
        let records = vec![
            LogRecord::new("2", at(2024, 2, 1, 9, 0)),
            LogRecord::new("1", at(2024, 1, 15, 9, 0)),
            LogRecord::new("2", at(2024, 1, 20, 9, 0)),
            LogRecord::new("3", at(2024, 1, 1, 9, 0)),
        ];

        let filter = LogFilter::from_query(&query(Some("2024-01-10"), None, Some("2"))).unwrap();
        let kept = filter.apply(records);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].record_time, at(2024, 2, 1, 9, 0));
        assert_eq!(kept[1].record_time, at(2024, 1, 20, 9, 0));
    }

    #[test]
    fn test_no_criteria_keeps_everything() {
        let records = vec![
            LogRecord::new("1", at(2024, 1, 1, 9, 0)),
            LogRecord::new("2", at(2025, 6, 1, 9, 0)),
        ];
        assert_eq!(LogFilter::default().apply(records.clone()), records);
    }
}
