//! Device connection manager.
//!
//! The terminal serves one session at a time, so every device interaction
//! goes through a single [`ConnectionManager`]. It owns an async mutex that
//! is held for the whole acquire → call → release sequence, which
//! serializes concurrent HTTP requests on the device link.
//!
//! # Sequence
//!
//! ```text
//! with_connection(f)
//!   │
//!   ├─ lock slot
//!   ├─ session = slot.take() or acquire()     connect, on failure wait 1s
//!   │                                          and connect once more
//!   ├─ result = f(&mut session)
//!   ├─ persistent && ok  → slot = session
//!   │  otherwise         → release(session)    errors logged, not returned
//!   └─ unlock
//! ```
//!
//! The sequence runs on its own Tokio task. Dropping the future returned by
//! [`with_connection`](ConnectionManager::with_connection), as happens when
//! an HTTP client goes away, does not interrupt a device session halfway.
//! If the operation panics, the session is released before the panic is
//! resumed, so the device never keeps a stale session.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::ConnectionMode;
use crate::error::{GatewayError, GatewayResult};
use punchgate_core::constants::RECONNECT_DELAY_MS;
use punchgate_device::{DeviceConnector, DeviceError, DeviceSession};

/// Serializes access to one device.
pub struct ConnectionManager<C: DeviceConnector> {
    connector: C,
    mode: ConnectionMode,
    retry_delay: Duration,
    /// Held across the whole device sequence; holds the open session in
    /// persistent mode.
    slot: Mutex<Option<C::Session>>,
}

impl<C: DeviceConnector> ConnectionManager<C> {
    pub fn new(connector: C, mode: ConnectionMode) -> Self {
        Self {
            connector,
            mode,
            retry_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            slot: Mutex::new(None),
        }
    }

    /// Override the delay before the reconnect attempt.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a session, retrying exactly once after the reconnect delay.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Connection`] with the cause of the second
    /// failure.
    pub async fn acquire(&self) -> GatewayResult<C::Session> {
        let device = self.connector.address();

        match self.connector.connect().await {
            Ok(session) => {
                debug!(%device, "Device session opened");
                Ok(session)
            }
            Err(first) => {
                warn!(
                    %device,
                    error = %first,
                    delay_ms = self.retry_delay.as_millis() as u64,
                    "Device connection failed, retrying"
                );
                tokio::time::sleep(self.retry_delay).await;

                match self.connector.connect().await {
                    Ok(session) => {
                        info!(%device, "Device session opened on retry");
                        Ok(session)
                    }
                    Err(err) => {
                        error!(%device, error = %err, "Device unreachable after retry");
                        Err(GatewayError::Connection(err))
                    }
                }
            }
        }
    }

    /// Close a session. Failures are logged and swallowed.
    pub async fn release(&self, session: C::Session) {
        match session.disconnect().await {
            Ok(()) => debug!(device = %self.connector.address(), "Device session closed"),
            Err(err) => warn!(
                device = %self.connector.address(),
                error = %err,
                "Failed to close device session"
            ),
        }
    }

    /// Run one device operation with exclusive access to the device.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use punchgate_device::{DeviceSession, ZkConnector};
    /// use punchgate_server::{ConnectionManager, ConnectionMode};
    ///
    /// # async fn example() -> punchgate_server::GatewayResult<()> {
    /// let manager = Arc::new(ConnectionManager::new(
    ///     ZkConnector::default(),
    ///     ConnectionMode::PerRequest,
    /// ));
    /// let users = manager
    ///     .with_connection(|session| Box::pin(session.get_users()))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_connection<T, F>(self: &Arc<Self>, operation: F) -> GatewayResult<T>
    where
        T: Send + 'static,
        F: for<'a> FnOnce(&'a mut C::Session) -> BoxFuture<'a, Result<T, DeviceError>>
            + Send
            + 'static,
    {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.run(operation).await }).await?
    }

    async fn run<T, F>(&self, operation: F) -> GatewayResult<T>
    where
        F: for<'a> FnOnce(&'a mut C::Session) -> BoxFuture<'a, Result<T, DeviceError>>,
    {
        let mut slot = self.slot.lock().await;

        let mut session = match slot.take() {
            Some(session) => {
                debug!("Reusing persistent device session");
                session
            }
            None => self.acquire().await?,
        };

        let outcome = AssertUnwindSafe(operation(&mut session))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                error!("Device operation panicked, closing session");
                self.release(session).await;
                std::panic::resume_unwind(panic);
            }
        };

        match (self.mode, &result) {
            (ConnectionMode::Persistent, Ok(_)) => *slot = Some(session),
            _ => self.release(session).await,
        }

        result.map_err(GatewayError::device_call)
    }

    /// Close the persistent session, if one is open.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.take() {
            info!(device = %self.connector.address(), "Closing persistent device session");
            self.release(session).await;
        }
    }
}
