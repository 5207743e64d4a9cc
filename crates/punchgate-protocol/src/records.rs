//! Decoding of the user and attendance tables.
//!
//! Both tables arrive from a bulk read as one buffer: a u32 LE byte count
//! followed by fixed-size records. Text fields are NUL-padded ASCII.
//!
//! # User record (72 bytes)
//!
//! ```text
//! 0      2     3          11          35        39        48         57     72
//! | uid  | role| password | name      | card    | (pad)   | user id  | (pad) |
//!  u16 LE  u8    8 bytes    24 bytes    u32 LE              9 bytes
//! ```
//!
//! # Attendance record (40 bytes)
//!
//! ```text
//! 0        2              26       27         31      32      40
//! | sn     | user id      | status | time     | punch | (pad) |
//!  u16 LE    24 bytes       u8       u32 LE     u8
//! ```
//!
//! A buffer whose size prefix is missing, overstates the data received, or is
//! not a whole number of records is rejected with
//! [`Error::InvalidRecordData`]; those are the shapes a half-failed transfer
//! produces.

use crate::time::{decode_time, encode_time};
use bytes::{BufMut, Bytes, BytesMut};
use punchgate_core::{
    DeviceUserId, Error, LogRecord, Result, User,
    constants::{ATTENDANCE_RECORD_SIZE, RECORD_BUFFER_PREFIX, USER_RECORD_SIZE},
};

/// Decode a TCP user table buffer.
pub fn decode_users(buf: &[u8]) -> Result<Vec<User>> {
    let body = record_body(buf, USER_RECORD_SIZE, "user")?;

    Ok(body
        .chunks_exact(USER_RECORD_SIZE)
        .map(|rec| User {
            uid: u16::from_le_bytes([rec[0], rec[1]]),
            role: rec[2],
            password: ascii_field(&rec[3..11]),
            name: ascii_field(&rec[11..35]),
            card_number: u32::from_le_bytes([rec[35], rec[36], rec[37], rec[38]]),
            user_id: ascii_field(&rec[48..57]),
        })
        .collect())
}

/// Decode a TCP attendance table buffer.
///
/// Records keep the order the device returned them in.
pub fn decode_attendance(buf: &[u8]) -> Result<Vec<LogRecord>> {
    let body = record_body(buf, ATTENDANCE_RECORD_SIZE, "attendance")?;

    Ok(body
        .chunks_exact(ATTENDANCE_RECORD_SIZE)
        .map(|rec| LogRecord {
            user_sn: u16::from_le_bytes([rec[0], rec[1]]),
            device_user_id: DeviceUserId::new(ascii_field(&rec[2..26])),
            status: rec[26],
            record_time: decode_time(u32::from_le_bytes([rec[27], rec[28], rec[29], rec[30]])),
            punch: rec[31],
            ip: None,
        })
        .collect())
}

/// Encode users into a TCP user table buffer.
///
/// Text longer than its field is truncated.
pub fn encode_users(users: &[User]) -> Bytes {
    let mut buf = buffer_with_prefix(users.len() * USER_RECORD_SIZE);
    for user in users {
        buf.put_u16_le(user.uid);
        buf.put_u8(user.role);
        put_ascii(&mut buf, &user.password, 8);
        put_ascii(&mut buf, &user.name, 24);
        buf.put_u32_le(user.card_number);
        buf.put_bytes(0, 9);
        put_ascii(&mut buf, &user.user_id, 9);
        buf.put_bytes(0, 15);
    }
    buf.freeze()
}

/// Encode records into a TCP attendance table buffer.
pub fn encode_attendance(records: &[LogRecord]) -> Bytes {
    let mut buf = buffer_with_prefix(records.len() * ATTENDANCE_RECORD_SIZE);
    for record in records {
        buf.put_u16_le(record.user_sn);
        put_ascii(&mut buf, record.device_user_id.as_str(), 24);
        buf.put_u8(record.status);
        buf.put_u32_le(encode_time(record.record_time));
        buf.put_u8(record.punch);
        buf.put_bytes(0, 8);
    }
    buf.freeze()
}

fn record_body<'a>(buf: &'a [u8], record_size: usize, table: &str) -> Result<&'a [u8]> {
    let Some((prefix, body)) = buf.split_first_chunk::<RECORD_BUFFER_PREFIX>() else {
        return Err(Error::invalid_record_data(format!(
            "{table} buffer has no size prefix ({} bytes)",
            buf.len()
        )));
    };

    let declared = u32::from_le_bytes(*prefix) as usize;
    if declared > body.len() {
        return Err(Error::invalid_record_data(format!(
            "{table} buffer declares {declared} bytes but carries {}",
            body.len()
        )));
    }
    if declared % record_size != 0 {
        return Err(Error::invalid_record_data(format!(
            "{table} buffer size {declared} is not a multiple of {record_size}"
        )));
    }

    Ok(&body[..declared])
}

fn ascii_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn put_ascii(buf: &mut BytesMut, text: &str, width: usize) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(width);
    buf.put_slice(&bytes[..len]);
    buf.put_bytes(0, width - len);
}

fn buffer_with_prefix(body_len: usize) -> BytesMut {
    let mut buf = BytesMut::with_capacity(RECORD_BUFFER_PREFIX + body_len);
    buf.put_u32_le(body_len as u32);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(uid: u16, name: &str, user_id: &str) -> User {
        User {
            uid,
            role: 0,
            password: "1234".to_string(),
            name: name.to_string(),
            card_number: 9876543,
            user_id: user_id.to_string(),
        }
    }

    #[test]
    fn test_decode_user_record_offsets() {
        let mut rec = vec![0u8; 4 + USER_RECORD_SIZE];
        rec[0..4].copy_from_slice(&(USER_RECORD_SIZE as u32).to_le_bytes());
        let r = &mut rec[4..];
        r[0..2].copy_from_slice(&12u16.to_le_bytes());
        r[2] = 14;
        r[3..7].copy_from_slice(b"4321");
        r[11..16].copy_from_slice(b"Maria");
        r[35..39].copy_from_slice(&555u32.to_le_bytes());
        r[48..51].copy_from_slice(b"120");

        let users = decode_users(&rec).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].uid, 12);
        assert_eq!(users[0].role, 14);
        assert_eq!(users[0].password, "4321");
        assert_eq!(users[0].name, "Maria");
        assert_eq!(users[0].card_number, 555);
        assert_eq!(users[0].user_id, "120");
    }

    #[test]
    fn test_users_survive_encoding() {
        let users = vec![user(1, "Ana", "1"), user(2, "Bruno Carvalho", "2002")];
        let buf = encode_users(&users);

        assert_eq!(buf.len(), 4 + 2 * USER_RECORD_SIZE);
        assert_eq!(decode_users(&buf).unwrap(), users);
    }

    #[test]
    fn test_long_name_is_truncated() {
        let long = "x".repeat(40);
        let buf = encode_users(&[user(1, &long, "1")]);
        let decoded = decode_users(&buf).unwrap();
        assert_eq!(decoded[0].name.len(), 24);
    }

    #[test]
    fn test_decode_attendance_record_offsets() {
        let time = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        let mut rec = vec![0u8; 4 + ATTENDANCE_RECORD_SIZE];
        rec[0..4].copy_from_slice(&(ATTENDANCE_RECORD_SIZE as u32).to_le_bytes());
        let r = &mut rec[4..];
        r[0..2].copy_from_slice(&3u16.to_le_bytes());
        r[2..3].copy_from_slice(b"7");
        r[26] = 1;
        r[27..31].copy_from_slice(&encode_time(time).to_le_bytes());
        r[31] = 4;

        let records = decode_attendance(&rec).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_sn, 3);
        assert_eq!(records[0].device_user_id.as_str(), "7");
        assert_eq!(records[0].status, 1);
        assert_eq!(records[0].record_time, time);
        assert_eq!(records[0].punch, 4);
    }

    #[test]
    fn test_empty_table() {
        assert!(decode_attendance(&0u32.to_le_bytes()).unwrap().is_empty());
        assert!(decode_users(&encode_users(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_missing_prefix_rejected() {
        let result = decode_attendance(&[0x28, 0x00]);
        assert!(matches!(result, Err(Error::InvalidRecordData { .. })));
    }

    #[test]
    fn test_overstated_size_rejected() {
        let mut buf = vec![0u8; 4 + ATTENDANCE_RECORD_SIZE];
        buf[0..4].copy_from_slice(&80u32.to_le_bytes());
        let result = decode_attendance(&buf);
        assert!(matches!(result, Err(Error::InvalidRecordData { .. })));
    }

    #[test]
    fn test_partial_record_rejected() {
        let mut buf = vec![0u8; 4 + 50];
        buf[0..4].copy_from_slice(&50u32.to_le_bytes());
        let result = decode_attendance(&buf);
        assert!(matches!(result, Err(Error::InvalidRecordData { .. })));
    }

    #[test]
    fn test_trailing_bytes_after_declared_size_ignored() {
        let record = LogRecord::new(
            "9",
            NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        let mut buf = encode_attendance(std::slice::from_ref(&record)).to_vec();
        buf.extend_from_slice(&[0xee; 6]);

        assert_eq!(decode_attendance(&buf).unwrap(), vec![record]);
    }
}
