//! In-memory attendance device for testing and development.
//!
//! [`MockDevice`] implements [`DeviceConnector`] without any network I/O.
//! Clones share state, so a test keeps one clone as a handle to script
//! failures and inspect session counters while the gateway owns the other.
//!
//! # Examples
//!
//! ```
//! use punchgate_device::{DeviceConnector, DeviceSession, MockDevice};
//! use punchgate_core::LogRecord;
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> punchgate_device::Result<()> {
//!     let time = NaiveDate::from_ymd_opt(2024, 1, 15)
//!         .unwrap()
//!         .and_hms_opt(9, 0, 0)
//!         .unwrap();
//!     let device = MockDevice::new().with_records(vec![LogRecord::new("7", time)]);
//!
//!     let mut session = device.connect().await?;
//!     assert_eq!(session.get_attendances().await?.len(), 1);
//!     session.disconnect().await?;
//!
//!     assert_eq!(device.stats().sessions_opened, device.stats().sessions_closed);
//!     Ok(())
//! }
//! ```

use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use crate::error::{DeviceError, Result};
use crate::traits::{DeviceConnector, DeviceSession};
use punchgate_core::{LogRecord, User};
use punchgate_protocol::decode_attendance;

/// Snapshot of session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockStats {
    /// Calls to `connect`, successful or not
    pub connect_attempts: u32,

    /// Sessions successfully opened
    pub sessions_opened: u32,

    /// Sessions closed with `disconnect`
    pub sessions_closed: u32,

    /// Sessions currently open
    pub active_sessions: u32,

    /// Highest number of sessions open at the same time
    pub max_active_sessions: u32,

    /// Device operations (`get_users` / `get_attendances`) started
    pub calls: u32,
}

/// Attendance payload served by the mock.
#[derive(Debug, Clone)]
enum Attendance {
    Records(Vec<LogRecord>),
    /// Raw table buffer, decoded on every read like a real transfer.
    Raw(Bytes),
}

#[derive(Debug)]
struct MockState {
    users: Vec<User>,
    attendance: Attendance,
    connect_failures: u32,
    fail_users: bool,
    fail_attendance: bool,
    fail_disconnect: bool,
    latency: Duration,
    stats: MockStats,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            attendance: Attendance::Records(Vec::new()),
            connect_failures: 0,
            fail_users: false,
            fail_attendance: false,
            fail_disconnect: false,
            latency: Duration::ZERO,
            stats: MockStats::default(),
        }
    }
}

/// Mock attendance device.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    /// Create an empty mock device that accepts every connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the given user table.
    pub fn with_users(self, users: Vec<User>) -> Self {
        self.lock().users = users;
        self
    }

    /// Serve the given attendance records.
    pub fn with_records(self, records: Vec<LogRecord>) -> Self {
        self.lock().attendance = Attendance::Records(records);
        self
    }

    /// Serve a raw attendance table buffer instead of decoded records.
    ///
    /// Reads decode the buffer with the wire-format decoder, so a malformed
    /// buffer surfaces as [`DeviceError::InvalidResponse`].
    pub fn with_raw_attendance(self, buffer: impl Into<Bytes>) -> Self {
        self.lock().attendance = Attendance::Raw(buffer.into());
        self
    }

    /// Delay every device operation by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Refuse the next `count` connection attempts.
    pub fn fail_next_connects(&self, count: u32) {
        self.lock().connect_failures = count;
    }

    /// Make `get_users` fail until reset.
    pub fn set_fail_users(&self, fail: bool) {
        self.lock().fail_users = fail;
    }

    /// Make `get_attendances` fail until reset.
    pub fn set_fail_attendance(&self, fail: bool) {
        self.lock().fail_attendance = fail;
    }

    /// Make `disconnect` report an error (the session still counts as closed).
    pub fn set_fail_disconnect(&self, fail: bool) {
        self.lock().fail_disconnect = fail;
    }

    /// Current session counters.
    pub fn stats(&self) -> MockStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the counters from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeviceConnector for MockDevice {
    type Session = MockSession;

    async fn connect(&self) -> Result<MockSession> {
        let latency = {
            let mut state = self.lock();
            state.stats.connect_attempts += 1;

            if state.connect_failures > 0 {
                state.connect_failures -= 1;
                debug!(
                    remaining = state.connect_failures,
                    "Mock device refusing connection"
                );
                return Err(DeviceError::ConnectionLost(
                    "connection refused by mock device".to_string(),
                ));
            }

            state.stats.sessions_opened += 1;
            state.stats.active_sessions += 1;
            state.stats.max_active_sessions = state
                .stats
                .max_active_sessions
                .max(state.stats.active_sessions);
            state.latency
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        Ok(MockSession {
            device: self.clone(),
        })
    }

    fn address(&self) -> String {
        "mock".to_string()
    }
}

/// Session opened by [`MockDevice`].
#[derive(Debug)]
pub struct MockSession {
    device: MockDevice,
}

impl MockSession {
    /// Count the call and return the configured latency.
    fn begin_call(&self) -> Duration {
        let mut state = self.device.lock();
        state.stats.calls += 1;
        state.latency
    }
}

impl DeviceSession for MockSession {
    async fn get_users(&mut self) -> Result<Vec<User>> {
        let latency = self.begin_call();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let state = self.device.lock();
        if state.fail_users {
            return Err(DeviceError::other("user table read failed"));
        }
        Ok(state.users.clone())
    }

    async fn get_attendances(&mut self) -> Result<Vec<LogRecord>> {
        let latency = self.begin_call();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let attendance = {
            let state = self.device.lock();
            if state.fail_attendance {
                return Err(DeviceError::other("attendance table read failed"));
            }
            state.attendance.clone()
        };

        match attendance {
            Attendance::Records(records) => Ok(records),
            Attendance::Raw(buffer) => Ok(decode_attendance(&buffer)?),
        }
    }

    async fn disconnect(self) -> Result<()> {
        let mut state = self.device.lock();
        state.stats.sessions_closed += 1;
        state.stats.active_sessions = state.stats.active_sessions.saturating_sub(1);

        if state.fail_disconnect {
            return Err(DeviceError::ConnectionLost(
                "mock device dropped during exit".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use punchgate_core::DeviceUserId;

    fn record(id: &str, day: u32) -> LogRecord {
        LogRecord::new(
            id,
            NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_session_counters() {
        let device = MockDevice::new();

        let session = device.connect().await.unwrap();
        assert_eq!(device.stats().active_sessions, 1);

        session.disconnect().await.unwrap();
        let stats = device.stats();
        assert_eq!(stats.connect_attempts, 1);
        assert_eq!(stats.sessions_opened, 1);
        assert_eq!(stats.sessions_closed, 1);
        assert_eq!(stats.active_sessions, 0);
        assert_eq!(stats.max_active_sessions, 1);
    }

    #[tokio::test]
    async fn test_scripted_connect_failures() {
        let device = MockDevice::new();
        device.fail_next_connects(2);

        assert!(device.connect().await.is_err());
        assert!(device.connect().await.is_err());
        let session = device.connect().await.unwrap();
        session.disconnect().await.unwrap();

        let stats = device.stats();
        assert_eq!(stats.connect_attempts, 3);
        assert_eq!(stats.sessions_opened, 1);
    }

    #[tokio::test]
    async fn test_records_are_served_in_order() {
        let device = MockDevice::new().with_records(vec![record("2", 3), record("1", 1)]);

        let mut session = device.connect().await.unwrap();
        let records = session.get_attendances().await.unwrap();
        session.disconnect().await.unwrap();

        assert_eq!(records[0].device_user_id, DeviceUserId::from("2"));
        assert_eq!(records[1].device_user_id, DeviceUserId::from("1"));
        assert_eq!(device.stats().calls, 1);
    }

    #[tokio::test]
    async fn test_raw_attendance_is_decoded() {
        let table = punchgate_protocol::encode_attendance(&[record("9", 2)]);
        let device = MockDevice::new().with_raw_attendance(table);

        let mut session = device.connect().await.unwrap();
        let records = session.get_attendances().await.unwrap();
        session.disconnect().await.unwrap();

        assert_eq!(records, vec![record("9", 2)]);
    }

    #[tokio::test]
    async fn test_malformed_raw_attendance() {
        let device = MockDevice::new().with_raw_attendance(vec![0x50, 0x00]);

        let mut session = device.connect().await.unwrap();
        let result = session.get_attendances().await;
        session.disconnect().await.unwrap();

        assert!(result.unwrap_err().is_invalid_response());
    }

    #[tokio::test]
    async fn test_failures_can_be_reset() {
        let device = MockDevice::new();
        device.set_fail_users(true);

        let mut session = device.connect().await.unwrap();
        assert!(session.get_users().await.is_err());

        device.set_fail_users(false);
        assert!(session.get_users().await.unwrap().is_empty());
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_disconnect_still_closes() {
        let device = MockDevice::new();
        device.set_fail_disconnect(true);

        let session = device.connect().await.unwrap();
        assert!(session.disconnect().await.is_err());

        let stats = device.stats();
        assert_eq!(stats.sessions_closed, 1);
        assert_eq!(stats.active_sessions, 0);
    }
}
