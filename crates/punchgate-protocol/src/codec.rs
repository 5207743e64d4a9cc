//! Tokio codec for ZK protocol TCP framing.
//!
//! This module provides a Tokio-compatible codec so a device connection can
//! be driven through `Framed<TcpStream, ZkCodec>` as a stream of
//! [`Packet`]s and a sink accepting them.
//!
//! # Architecture
//!
//! ```text
//! TCP Stream -> Decoder -> Packet (header parsed, data split off)
//! Packet -> Encoder -> TCP Stream (magic + length envelope, checksum filled)
//! ```
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use punchgate_protocol::{CommandCode, Packet, ZkCodec};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("192.168.13.201:4370").await?;
//! let mut framed = Framed::new(stream, ZkCodec::new());
//!
//! framed.send(Packet::new(CommandCode::Connect, 0, 1, Vec::new())).await?;
//! if let Some(reply) = framed.next().await {
//!     println!("session id: {}", reply?.session_id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Frame Size Limit
//!
//! A corrupted length field could otherwise make the decoder wait for (and
//! buffer) gigabytes. Frames larger than the configured maximum (default
//! 1 MiB, comfortably above one 65472-byte chunk) are rejected.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::Packet;
use punchgate_core::{
    Error, Result,
    constants::{PACKET_HEADER_SIZE, TCP_MAGIC, TCP_PREFIX_SIZE},
};

/// Default maximum frame size in bytes (1 MiB).
const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Tokio codec for ZK protocol packets over TCP.
#[derive(Debug)]
pub struct ZkCodec {
    /// Maximum allowed packet size in bytes (excluding the TCP envelope).
    max_frame_size: usize,
}

impl ZkCodec {
    /// Create a new codec with the default maximum frame size.
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create a new codec with a custom maximum frame size.
    ///
    /// # Example
    ///
    /// ```
    /// use punchgate_protocol::ZkCodec;
    ///
    /// let codec = ZkCodec::with_max_frame_size(128 * 1024);
    /// assert_eq!(codec.max_frame_size(), 128 * 1024);
    /// ```
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Get the current maximum frame size.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for ZkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ZkCodec {
    type Item = Packet;
    type Error = Error;

    /// Decode one packet from the byte stream.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Packet))` - A complete packet was decoded
    /// - `Ok(None)` - Need more data to complete the frame
    /// - `Err(Error)` - Bad magic, oversize or truncated frame, unknown command
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < TCP_PREFIX_SIZE {
            return Ok(None);
        }

        if src[0..4] != TCP_MAGIC {
            return Err(Error::InvalidMagic {
                found: [src[0], src[1], src[2], src[3]],
            });
        }

        let length = u32::from_le_bytes([src[4], src[5], src[6], src[7]]) as usize;
        if length > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size: length,
                max_size: self.max_frame_size,
            });
        }
        if length < PACKET_HEADER_SIZE {
            return Err(Error::TruncatedPacket {
                length,
                required: PACKET_HEADER_SIZE,
            });
        }

        if src.len() < TCP_PREFIX_SIZE + length {
            src.reserve(TCP_PREFIX_SIZE + length - src.len());
            return Ok(None);
        }

        src.advance(TCP_PREFIX_SIZE);
        let packet = Packet::parse(src.split_to(length).freeze())?;
        Ok(Some(packet))
    }
}

impl Encoder<Packet> for ZkCodec {
    type Error = Error;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        let size = item.size();
        if size > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size,
                max_size: self.max_frame_size,
            });
        }

        dst.reserve(TCP_PREFIX_SIZE + size);
        dst.put_slice(&TCP_MAGIC);
        dst.put_u32_le(size as u32);
        item.encode_into(dst);

        Ok(())
    }
}
