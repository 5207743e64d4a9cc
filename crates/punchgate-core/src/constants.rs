//! Core constants for the ZK attendance protocol and the gateway defaults.
//!
//! This module centralizes every protocol-level constant used by the
//! punchgate workspace: TCP framing, packet layout, record sizes, bulk-read
//! chunking and the default addresses of both the device and the HTTP
//! gateway.
//!
//! # Protocol Structure
//!
//! Over TCP every ZK packet travels inside a small envelope:
//!
//! ```text
//! 50 50 82 7D | LEN (u32 LE) | CMD | CHKSUM | SESSION | REPLY | DATA...
//! ^^^^^^^^^^^   ^^^^^^^^^^^^   \_______ packet header ______/
//! magic         packet length        (4 x u16 LE)
//! ```
//!
//! # Usage
//!
//! ```
//! use punchgate_core::constants::*;
//!
//! assert_eq!(TCP_MAGIC, [0x50, 0x50, 0x82, 0x7d]);
//! assert_eq!(TCP_PREFIX_SIZE + PACKET_HEADER_SIZE, 16);
//!
//! use std::time::Duration;
//! let timeout = Duration::from_millis(DEFAULT_DEVICE_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 5);
//! ```

// ============================================================================
// TCP Framing
// ============================================================================

/// Magic bytes opening every TCP frame exchanged with the device.
pub const TCP_MAGIC: [u8; 4] = [0x50, 0x50, 0x82, 0x7d];

/// Size of the TCP envelope (magic + u32 payload length).
pub const TCP_PREFIX_SIZE: usize = 8;

/// Size of the packet header (command, checksum, session id, reply id).
pub const PACKET_HEADER_SIZE: usize = 8;

/// Modulus used by the packet checksum and the reply id counter.
pub const USHRT_MAX: u32 = 65535;

// ============================================================================
// Bulk Reads
// ============================================================================

/// Largest chunk requested with a single `CMD_DATA_RDY`.
///
/// Devices reject chunk requests above this size, so bulk reads larger than
/// one chunk are split.
pub const MAX_CHUNK_SIZE: usize = 65472;

/// Largest table transfer the client accepts from a device (16 MiB).
///
/// Well above a full attendance log, and below `i32::MAX` so every chunk
/// offset fits the signed field of a chunk request.
pub const MAX_TABLE_SIZE: usize = 16 * 1024 * 1024;

/// Size of the u32 length prefix in front of user and attendance buffers.
pub const RECORD_BUFFER_PREFIX: usize = 4;

/// Size of one user record in a TCP user buffer.
pub const USER_RECORD_SIZE: usize = 72;

/// Size of one attendance record in a TCP attendance buffer.
pub const ATTENDANCE_RECORD_SIZE: usize = 40;

/// `fct` argument for the user table bulk read.
pub const USER_TABLE_FCT: i32 = 5;

// ============================================================================
// Device Defaults
// ============================================================================

/// Default device address.
pub const DEFAULT_DEVICE_IP: &str = "192.168.13.201";

/// Default device TCP port.
pub const DEFAULT_DEVICE_PORT: u16 = 4370;

/// Default timeout for every device socket operation (milliseconds).
pub const DEFAULT_DEVICE_TIMEOUT_MS: u64 = 5000;

/// Delay before the single reconnect attempt (milliseconds).
///
/// A failed connect is retried exactly once after this delay.
pub const RECONNECT_DELAY_MS: u64 = 1000;

// ============================================================================
// Gateway Defaults
// ============================================================================

/// Default HTTP bind host (all interfaces).
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default HTTP bind port.
pub const DEFAULT_HTTP_PORT: u16 = 3000;
