//! TCP client for ZK attendance terminals.
//!
//! This module provides the client that opens a session on the terminal,
//! bulk-reads its user and attendance tables, and closes the session. The
//! client uses [`ZkCodec`] for framing over Tokio's async I/O.
//!
//! # Session Lifecycle
//!
//! ```text
//! ZkClient                                   Device
//!    │── TCP connect ─────────────────────────►│
//!    │── CMD_CONNECT ─────────────────────────►│
//!    │◄──────────────────── CMD_ACK_OK (session)│
//!    │── CMD_DATA_WRRQ (table) ───────────────►│
//!    │◄──────── CMD_DATA (inline) or ACK (size)│
//!    │── CMD_DATA_RDY (chunk) ────────────────►│   repeated per
//!    │◄── CMD_PREPARE_DATA, CMD_DATA…, ACK_OK ─│   65472-byte chunk
//!    │── CMD_FREE_DATA ───────────────────────►│
//!    │── CMD_EXIT ────────────────────────────►│
//!    │── TCP shutdown                          │
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use punchgate_device::{ZkClient, ZkClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ZkClientConfig {
//!     device_addr: "192.168.13.201:4370".parse()?,
//!     timeout: Duration::from_millis(5000),
//! };
//!
//! let mut client = ZkClient::new(config);
//! client.connect().await?;
//! let records = client.read_attendance().await?;
//! println!("{} punches", records.len());
//! client.exit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: the gateway decides the retry strategy
//! - **No keepalive**: sessions are short-lived
//! - **No comm key**: devices requiring one are reported as unauthorized
//!
//! # Timeout Handling
//!
//! Connect, send and receive each have the configured timeout (default
//! 5000ms). Closing the socket uses short fixed timeouts so a dead network
//! never blocks cleanup.

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use crate::error::{DeviceError, Result};
use crate::traits::{DeviceConnector, DeviceSession};
use punchgate_core::{
    LogRecord, User,
    constants::{
        DEFAULT_DEVICE_PORT, DEFAULT_DEVICE_TIMEOUT_MS, MAX_CHUNK_SIZE, USER_TABLE_FCT,
        USHRT_MAX,
    },
};
use punchgate_protocol::{
    CommandCode, Packet, ZkCodec, decode_attendance, decode_users,
    packet::{announced_size, chunk_request, read_buffer_request},
};

/// Configuration for the ZK client
///
/// # Example
///
/// ```
/// use punchgate_device::ZkClientConfig;
/// use std::time::Duration;
///
/// let config = ZkClientConfig {
///     device_addr: "10.0.0.7:4370".parse().unwrap(),
///     timeout: Duration::from_millis(2000),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ZkClientConfig {
    /// Device address to connect to
    pub device_addr: SocketAddr,

    /// Timeout for each I/O operation (connect, send, recv)
    pub timeout: Duration,
}

impl Default for ZkClientConfig {
    fn default() -> Self {
        Self {
            device_addr: SocketAddr::from(([192, 168, 13, 201], DEFAULT_DEVICE_PORT)),
            timeout: Duration::from_millis(DEFAULT_DEVICE_TIMEOUT_MS),
        }
    }
}

/// TCP client for one session with a ZK terminal
///
/// # Connection Lifecycle
///
/// 1. Create client with `new()`
/// 2. Open the session with `connect()`
/// 3. Read tables with `read_users()` / `read_attendance()`
/// 4. Close the session with `exit()`
pub struct ZkClient {
    /// Device address to connect to
    device_addr: SocketAddr,

    /// Framed TCP stream (None if not connected)
    framed: Option<Framed<TcpStream, ZkCodec>>,

    /// Timeout for all I/O operations
    timeout: Duration,

    /// Session id assigned by the device on connect
    session_id: u16,

    /// Counter stamped on every request
    reply_id: u16,
}

impl ZkClient {
    /// Create a new client with the given configuration
    ///
    /// The client is not connected after creation.
    ///
    /// # Example
    ///
    /// ```
    /// use punchgate_device::{ZkClient, ZkClientConfig};
    ///
    /// let client = ZkClient::new(ZkClientConfig::default());
    /// assert!(!client.is_connected());
    /// ```
    pub fn new(config: ZkClientConfig) -> Self {
        debug!("Creating ZK client for device {}", config.device_addr);

        Self {
            device_addr: config.device_addr,
            framed: None,
            timeout: config.timeout,
            session_id: 0,
            reply_id: 0,
        }
    }

    /// Open a TCP connection and a protocol session
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TCP connection times out or is refused
    /// - The device requires a communication key (`Unauthorized`)
    /// - The device answers `CMD_CONNECT` with anything but `CMD_ACK_OK`
    ///
    /// On error the socket is closed again.
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to device at {}", self.device_addr);

        let stream =
            match tokio::time::timeout(self.timeout, TcpStream::connect(self.device_addr)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    warn!("Connection failed: {}", e);
                    return Err(e.into());
                }
                Err(_) => {
                    warn!("Connection timeout after {}ms", self.timeout.as_millis());
                    return Err(DeviceError::ConnectionTimeout(self.timeout_ms()));
                }
            };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.framed = Some(Framed::new(stream, ZkCodec::new()));
        self.session_id = 0;
        self.reply_id = 0;

        let outcome = match self.execute(CommandCode::Connect, Bytes::new()).await {
            Ok(reply) => match reply.command {
                CommandCode::AckOk => {
                    self.session_id = reply.session_id;
                    Ok(())
                }
                CommandCode::AckUnauth => Err(DeviceError::Unauthorized),
                other => Err(DeviceError::UnexpectedReply {
                    command: CommandCode::Connect,
                    reply: other,
                }),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!(session_id = self.session_id, "Session opened with {}", self.device_addr);
                Ok(())
            }
            Err(e) => {
                self.close().await;
                Err(e)
            }
        }
    }

    /// Session id assigned by the device (0 when not connected)
    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    /// Check if the client holds an open socket
    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Read the full user table
    pub async fn read_users(&mut self) -> Result<Vec<User>> {
        let buffer = self
            .read_with_buffer(CommandCode::UserTable, USER_TABLE_FCT)
            .await?;
        let users = decode_users(&buffer)?;
        debug!(count = users.len(), "Decoded user table");
        Ok(users)
    }

    /// Read the full attendance log
    ///
    /// Every record is stamped with the device address.
    pub async fn read_attendance(&mut self) -> Result<Vec<LogRecord>> {
        let buffer = self
            .read_with_buffer(CommandCode::AttendanceTable, 0)
            .await?;
        let mut records = decode_attendance(&buffer)?;

        let ip = self.device_addr.ip().to_string();
        for record in &mut records {
            record.ip = Some(ip.clone());
        }

        debug!(count = records.len(), "Decoded attendance table");
        Ok(records)
    }

    /// Close the protocol session and the socket
    ///
    /// The socket is closed even when `CMD_EXIT` fails; the error is still
    /// returned. Calling this on a closed client is a no-op.
    pub async fn exit(&mut self) -> Result<()> {
        if self.framed.is_none() {
            return Ok(());
        }

        let outcome = match self.execute(CommandCode::Exit, Bytes::new()).await {
            Ok(reply) if reply.command == CommandCode::AckOk => Ok(()),
            Ok(reply) => Err(DeviceError::UnexpectedReply {
                command: CommandCode::Exit,
                reply: reply.command,
            }),
            Err(e) => Err(e),
        };

        self.close().await;
        self.session_id = 0;
        outcome
    }

    /// Bulk-read one device table.
    async fn read_with_buffer(&mut self, table: CommandCode, fct: i32) -> Result<Bytes> {
        let request = read_buffer_request(table, fct, 0);
        let reply = self.execute(CommandCode::ReadBuffer, request).await?;

        let data = match reply.command {
            CommandCode::Data => {
                trace!(size = reply.data.len(), "Table returned inline");
                reply.data
            }
            CommandCode::AckOk | CommandCode::PrepareData => {
                let size = match announced_size(&reply.data) {
                    Ok(size) => size,
                    Err(e) => {
                        warn!(?table, "Refusing bulk read: {}", e);
                        self.free_data().await;
                        return Err(e.into());
                    }
                };
                debug!(?table, size, "Reading table in chunks");

                let mut buffer = BytesMut::with_capacity(size);
                let mut start = 0;
                while start < size {
                    let chunk = (size - start).min(MAX_CHUNK_SIZE);
                    self.read_chunk(start, chunk, &mut buffer).await?;
                    start += chunk;
                }
                buffer.truncate(size);
                buffer.freeze()
            }
            reply if reply.is_error_reply() => {
                return Err(DeviceError::Rejected {
                    command: CommandCode::ReadBuffer,
                    reply,
                });
            }
            reply => {
                return Err(DeviceError::UnexpectedReply {
                    command: CommandCode::ReadBuffer,
                    reply,
                });
            }
        };

        self.free_data().await;
        Ok(data)
    }

    /// Fetch `size` bytes at `start` of the prepared buffer into `out`.
    async fn read_chunk(&mut self, start: usize, size: usize, out: &mut BytesMut) -> Result<()> {
        let reply = self
            .execute(CommandCode::ReadyChunk, chunk_request(start, size)?)
            .await?;

        match reply.command {
            CommandCode::Data => {
                out.extend_from_slice(&reply.data);
                Ok(())
            }
            CommandCode::PrepareData => {
                let target = out.len() + size;
                while out.len() < target {
                    let packet = self.recv().await?;
                    match packet.command {
                        CommandCode::Data => out.extend_from_slice(&packet.data),
                        reply if reply.is_error_reply() => {
                            return Err(DeviceError::Rejected {
                                command: CommandCode::ReadyChunk,
                                reply,
                            });
                        }
                        reply => {
                            return Err(DeviceError::UnexpectedReply {
                                command: CommandCode::ReadyChunk,
                                reply,
                            });
                        }
                    }
                }

                let ack = self.recv().await?;
                if ack.command != CommandCode::AckOk {
                    warn!(reply = %ack.command, "Chunk transfer not acknowledged");
                }
                Ok(())
            }
            reply if reply.is_error_reply() => Err(DeviceError::Rejected {
                command: CommandCode::ReadyChunk,
                reply,
            }),
            reply => Err(DeviceError::UnexpectedReply {
                command: CommandCode::ReadyChunk,
                reply,
            }),
        }
    }

    /// Release the device-side transfer buffer. Failures are only logged.
    async fn free_data(&mut self) {
        match self.execute(CommandCode::FreeData, Bytes::new()).await {
            Ok(reply) if reply.command == CommandCode::AckOk => {}
            Ok(reply) => warn!(reply = %reply.command, "Free data not acknowledged"),
            Err(e) => warn!("Failed to free device buffer: {}", e),
        }
    }

    /// Send a command and wait for its reply.
    async fn execute(&mut self, command: CommandCode, data: Bytes) -> Result<Packet> {
        self.send(command, data).await?;
        self.recv().await
    }

    async fn send(&mut self, command: CommandCode, data: Bytes) -> Result<()> {
        self.reply_id = ((u32::from(self.reply_id) + 1) % USHRT_MAX) as u16;
        let packet = Packet::new(command, self.session_id, self.reply_id, data);

        trace!(
            command = %packet.command,
            session_id = packet.session_id,
            reply_id = packet.reply_id,
            size = packet.data.len(),
            "Sending packet to device"
        );

        let framed = self.framed.as_mut().ok_or(DeviceError::NotConnected)?;

        match tokio::time::timeout(self.timeout, framed.send(packet)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(DeviceError::WriteTimeout(self.timeout_ms())),
        }
    }

    async fn recv(&mut self) -> Result<Packet> {
        let timeout = self.timeout;
        let framed = self.framed.as_mut().ok_or(DeviceError::NotConnected)?;

        match tokio::time::timeout(timeout, framed.next()).await {
            Ok(Some(Ok(packet))) => {
                trace!(
                    command = %packet.command,
                    session_id = packet.session_id,
                    reply_id = packet.reply_id,
                    size = packet.data.len(),
                    "Received packet from device"
                );
                if !packet.has_valid_checksum() {
                    debug!(command = %packet.command, "Packet checksum mismatch");
                }
                Ok(packet)
            }
            Ok(Some(Err(e))) => Err(e.into()),
            Ok(None) => Err(DeviceError::ConnectionLost(
                "Device closed connection".to_string(),
            )),
            Err(_) => Err(DeviceError::ReadTimeout(timeout.as_millis() as u64)),
        }
    }

    /// Flush and shut down the socket, ignoring errors.
    async fn close(&mut self) {
        if let Some(mut framed) = self.framed.take() {
            debug!("Closing connection to {}", self.device_addr);

            let flush_timeout = Duration::from_millis(500);
            match tokio::time::timeout(flush_timeout, framed.flush()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Error flushing during close: {}", e),
                Err(_) => warn!("Flush timeout during close ({}ms)", flush_timeout.as_millis()),
            }

            let mut stream = framed.into_inner();
            let shutdown_timeout = Duration::from_millis(500);
            match tokio::time::timeout(shutdown_timeout, stream.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Error during shutdown: {}", e),
                Err(_) => warn!(
                    "Shutdown timeout during close ({}ms)",
                    shutdown_timeout.as_millis()
                ),
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl Drop for ZkClient {
    fn drop(&mut self) {
        if self.framed.is_some() {
            debug!("ZkClient dropped while connected - socket closed without CMD_EXIT");
        }
    }
}

impl DeviceSession for ZkClient {
    async fn get_users(&mut self) -> Result<Vec<User>> {
        self.read_users().await
    }

    async fn get_attendances(&mut self) -> Result<Vec<LogRecord>> {
        self.read_attendance().await
    }

    async fn disconnect(mut self) -> Result<()> {
        self.exit().await
    }
}

/// Opens [`ZkClient`] sessions against one configured device.
#[derive(Debug, Clone, Default)]
pub struct ZkConnector {
    config: ZkClientConfig,
}

impl ZkConnector {
    pub fn new(config: ZkClientConfig) -> Self {
        Self { config }
    }
}

impl DeviceConnector for ZkConnector {
    type Session = ZkClient;

    async fn connect(&self) -> Result<ZkClient> {
        let mut client = ZkClient::new(self.config.clone());
        client.connect().await?;
        Ok(client)
    }

    fn address(&self) -> String {
        self.config.device_addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ZkClientConfig::default();
        assert_eq!(config.device_addr.to_string(), "192.168.13.201:4370");
        assert_eq!(config.timeout.as_millis(), 5000);
    }

    #[test]
    fn test_client_not_connected_initially() {
        let client = ZkClient::new(ZkClientConfig::default());
        assert!(!client.is_connected());
        assert_eq!(client.session_id(), 0);
    }

    #[tokio::test]
    async fn test_read_without_connect() {
        let mut client = ZkClient::new(ZkClientConfig::default());

        let result = client.read_users().await;
        assert!(matches!(result, Err(DeviceError::NotConnected)));
    }

    #[tokio::test]
    async fn test_exit_when_not_connected() {
        let mut client = ZkClient::new(ZkClientConfig::default());
        client.exit().await.unwrap();
        client.exit().await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_timeout() {
        // RFC 5737 TEST-NET-1, should be unreachable
        let config = ZkClientConfig {
            device_addr: "192.0.2.1:4370".parse().unwrap(),
            timeout: Duration::from_millis(100),
        };

        let mut client = ZkClient::new(config);
        let result = client.connect().await;

        assert!(matches!(
            result,
            Err(DeviceError::ConnectionTimeout(100)) | Err(DeviceError::Io(_))
        ));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_connector_address() {
        let connector = ZkConnector::default();
        assert_eq!(connector.address(), "192.168.13.201:4370");
    }
}
