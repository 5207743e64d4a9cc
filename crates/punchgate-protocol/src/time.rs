//! Packed device timestamps.
//!
//! Attendance records carry their punch time as a single `u32` counting
//! seconds in a simplified calendar where every month has 31 days:
//!
//! ```text
//! ((((year - 2000) * 12 + month0) * 31 + day - 1) * 24 + hour) * 60 + minute) * 60 + second
//! ```
//!
//! Because months are padded to 31 days, a raw value can name a day that does
//! not exist (e.g. February 30th). Decoding rolls such values over into the
//! following month, so every `u32` decodes to some wall-clock time.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

/// Decode a packed device timestamp.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use punchgate_protocol::decode_time;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
///     .unwrap()
///     .and_hms_opt(8, 30, 5)
///     .unwrap();
/// let raw = ((((24 * 12) * 31 + 14) * 24 + 8) * 60 + 30) * 60 + 5;
/// assert_eq!(decode_time(raw), expected);
/// ```
pub fn decode_time(raw: u32) -> NaiveDateTime {
    let mut t = raw;
    let second = t % 60;
    t /= 60;
    let minute = t % 60;
    t /= 60;
    let hour = t % 24;
    t /= 24;
    let day_offset = t % 31;
    t /= 31;
    let month0 = t % 12;
    t /= 12;
    let year = 2000 + t as i32;

    // Start from the first of the month and add days so out-of-range
    // days roll into the next month instead of failing.
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_hms_opt(hour, minute, second)
        .unwrap_or_default();

    first + Duration::days(i64::from(day_offset))
}

/// Encode a wall-clock time into the packed device format.
///
/// Years before 2000 saturate to the epoch of the packed format.
pub fn encode_time(time: NaiveDateTime) -> u32 {
    let years = u32::try_from(time.year() - 2000).unwrap_or(0);
    let days = (years * 12 + time.month0()) * 31 + time.day0();
    ((days * 24 + time.hour()) * 60 + time.minute()) * 60 + time.second()
}
