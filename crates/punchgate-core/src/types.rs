use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// User identifier as enrolled on the device.
///
/// The device stores user ids as short ASCII strings, but upstream sources
/// (exports, other gateways, hand-written fixtures) frequently carry them as
/// numbers. Deserialization accepts both and always normalizes to a string,
/// so `7` and `"7"` are the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceUserId(String);

impl DeviceUserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// String comparison against a query value.
    #[must_use]
    pub fn matches(&self, wanted: &str) -> bool {
        self.0 == wanted
    }
}

impl fmt::Display for DeviceUserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceUserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for DeviceUserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for DeviceUserId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Signed(n) => Self(n.to_string()),
        })
    }
}

/// User record as reported by the device.
///
/// Passed through to API clients unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal slot number on the device
    pub uid: u16,

    /// Privilege level (0 = user, 14 = admin on most firmwares)
    pub role: u8,

    /// Keypad password, empty when not set
    pub password: String,

    /// Display name
    pub name: String,

    /// RFID card number, 0 when no card is enrolled
    #[serde(rename = "cardno")]
    pub card_number: u32,

    /// Enrolment id shown on the terminal
    pub user_id: String,
}

/// One attendance punch reported by the device.
///
/// `record_time` is the terminal's local wall-clock time; the device has no
/// notion of time zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Sequence number of the user slot that punched
    #[serde(default)]
    pub user_sn: u16,

    /// Enrolment id of the user that punched
    pub device_user_id: DeviceUserId,

    /// When the punch happened (device local time)
    pub record_time: NaiveDateTime,

    /// Verification method (fingerprint, card, password...)
    #[serde(default)]
    pub status: u8,

    /// Punch state (check-in, check-out, break...)
    #[serde(default)]
    pub punch: u8,

    /// Address of the device the record was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl LogRecord {
    pub fn new(device_user_id: impl Into<DeviceUserId>, record_time: NaiveDateTime) -> Self {
        Self {
            user_sn: 0,
            device_user_id: device_user_id.into(),
            record_time,
            status: 0,
            punch: 0,
            ip: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[rstest]
    #[case(json!("7"), "7")]
    #[case(json!(7), "7")]
    #[case(json!(-3), "-3")]
    #[case(json!("A-100"), "A-100")]
    fn test_device_user_id_accepts_strings_and_numbers(
        #[case] raw: serde_json::Value,
        #[case] expected: &str,
    ) {
        let id: DeviceUserId = serde_json::from_value(raw).unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[test]
    fn test_device_user_id_rejects_other_types() {
        let result: Result<DeviceUserId, _> = serde_json::from_value(json!({"id": 7}));
        assert!(result.is_err());
    }

    #[test]
    fn test_device_user_id_matches_as_string() {
        let numeric = DeviceUserId::from(7u64);
        let text = DeviceUserId::from("7");
        assert!(numeric.matches("7"));
        assert!(text.matches("7"));
        assert!(!text.matches("07"));
    }

    #[test]
    fn test_log_record_json_shape() {
        let mut record = LogRecord::new("42", at(2024, 1, 15));
        record.user_sn = 3;
        record.ip = Some("192.168.13.201".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userSn"], 3);
        assert_eq!(value["deviceUserId"], "42");
        assert_eq!(value["recordTime"], "2024-01-15T08:30:00");
        assert_eq!(value["ip"], "192.168.13.201");
    }

    #[test]
    fn test_log_record_from_minimal_json() {
        let record: LogRecord = serde_json::from_value(json!({
            "deviceUserId": 7,
            "recordTime": "2024-01-15T08:30:00"
        }))
        .unwrap();

        assert_eq!(record.device_user_id.as_str(), "7");
        assert_eq!(record.record_time, at(2024, 1, 15));
        assert_eq!(record.ip, None);
    }

    #[test]
    fn test_user_json_field_names() {
        let user = User {
            uid: 1,
            role: 14,
            password: String::new(),
            name: "Ana".to_string(),
            card_number: 123456,
            user_id: "1".to_string(),
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["cardno"], 123456);
        assert_eq!(value["userId"], "1");
        assert_eq!(value["role"], 14);
    }
}
