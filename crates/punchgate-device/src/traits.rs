//! Device collaborator trait definitions.
//!
//! These traits are the seam between the gateway and whatever actually
//! talks to the terminal. The gateway only ever opens a session, performs
//! one read, and closes the session; the traits model exactly that.
//!
//! Methods return `impl Future + Send` (Edition 2024 RPITIT) so the futures
//! can be driven from spawned Tokio tasks and HTTP handlers. Implementations
//! are free to write them as plain `async fn`.

use std::future::Future;

use crate::error::Result;
use punchgate_core::{LogRecord, User};

/// Opens sessions against one physical device.
///
/// # Examples
///
/// ```no_run
/// use punchgate_device::{DeviceConnector, DeviceSession, Result};
///
/// async fn count_users<C: DeviceConnector>(connector: &C) -> Result<usize> {
///     let mut session = connector.connect().await?;
///     let users = session.get_users().await;
///     session.disconnect().await?;
///     Ok(users?.len())
/// }
/// ```
pub trait DeviceConnector: Send + Sync + 'static {
    /// Session type produced by [`connect`](Self::connect).
    type Session: DeviceSession;

    /// Open a new session.
    fn connect(&self) -> impl Future<Output = Result<Self::Session>> + Send;

    /// Human-readable device address for logs.
    fn address(&self) -> String;
}

/// One open, non-reentrant session with the device.
///
/// [`disconnect`](Self::disconnect) consumes the session, so a session can
/// be closed at most once.
pub trait DeviceSession: Send + 'static {
    /// Read the full user table.
    fn get_users(&mut self) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Read the full attendance log, in device order.
    fn get_attendances(&mut self) -> impl Future<Output = Result<Vec<LogRecord>>> + Send;

    /// Close the session.
    fn disconnect(self) -> impl Future<Output = Result<()>> + Send;
}
