use crate::commands::CommandCode;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use punchgate_core::{Error, Result, constants::*};

/// Packet is the unit of exchange with the device, minus the TCP envelope.
///
/// # Wire Format
///
/// ```text
/// offset  0      2         4           6         8
///         | CMD  | CHKSUM  | SESSION   | REPLY   | DATA...
///         u16 LE u16 LE    u16 LE      u16 LE
/// ```
///
/// The checksum is computed over the whole packet with the checksum field
/// zeroed (see [`checksum`]). It is filled in by [`Packet::encode`]; packets
/// built in memory never carry a stale value.
///
/// # Example
///
/// ```
/// use punchgate_protocol::{CommandCode, Packet};
///
/// let packet = Packet::new(CommandCode::Connect, 0, 1, Vec::new());
/// let wire = packet.encode();
/// assert_eq!(wire.len(), 8);
///
/// let parsed = Packet::parse(wire).unwrap();
/// assert_eq!(parsed.command, CommandCode::Connect);
/// assert!(parsed.has_valid_checksum());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command (requests) or acknowledgement (replies)
    pub command: CommandCode,

    /// Session id assigned by the device on connect, 0 before that
    pub session_id: u16,

    /// Request counter echoed back by the device
    pub reply_id: u16,

    /// Command-specific payload
    pub data: Bytes,

    /// Checksum as read from the wire (None for locally built packets)
    wire_checksum: Option<u16>,
}

impl Packet {
    pub fn new(
        command: CommandCode,
        session_id: u16,
        reply_id: u16,
        data: impl Into<Bytes>,
    ) -> Self {
        Packet {
            command,
            session_id,
            reply_id,
            data: data.into(),
            wire_checksum: None,
        }
    }

    /// Total encoded size in bytes (header + data).
    pub fn size(&self) -> usize {
        PACKET_HEADER_SIZE + self.data.len()
    }

    /// Encode the packet with its checksum filled in.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Append the encoded packet to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        let start = dst.len();
        dst.reserve(self.size());
        dst.put_u16_le(self.command.code());
        dst.put_u16_le(0);
        dst.put_u16_le(self.session_id);
        dst.put_u16_le(self.reply_id);
        dst.put_slice(&self.data);

        let sum = checksum(&dst[start..]);
        dst[start + 2..start + 4].copy_from_slice(&sum.to_le_bytes());
    }

    /// Parse a packet from the bytes following the TCP envelope.
    ///
    /// # Errors
    /// - `Error::TruncatedPacket` if fewer than 8 header bytes are present
    /// - `Error::InvalidCommandCode` if the command is not a known code
    pub fn parse(mut bytes: Bytes) -> Result<Self> {
        if bytes.len() < PACKET_HEADER_SIZE {
            return Err(Error::TruncatedPacket {
                length: bytes.len(),
                required: PACKET_HEADER_SIZE,
            });
        }

        let command = CommandCode::parse(bytes.get_u16_le())?;
        let wire_checksum = bytes.get_u16_le();
        let session_id = bytes.get_u16_le();
        let reply_id = bytes.get_u16_le();

        Ok(Packet {
            command,
            session_id,
            reply_id,
            data: bytes,
            wire_checksum: Some(wire_checksum),
        })
    }

    /// Returns `false` only for a received packet whose checksum disagrees
    /// with its content.
    pub fn has_valid_checksum(&self) -> bool {
        match self.wire_checksum {
            Some(received) => {
                let mut buf = BytesMut::with_capacity(self.size());
                self.encode_into(&mut buf);
                u16::from_le_bytes([buf[2], buf[3]]) == received
            }
            None => true,
        }
    }
}

/// Compute the ZK packet checksum.
///
/// Sums the buffer as little-endian 16-bit words (a trailing odd byte is
/// added as-is), reducing modulo 65535 after each step, and returns
/// `65535 - sum - 1`. The checksum field itself must be zero in `buf`.
///
/// # Example
///
/// ```
/// use punchgate_protocol::checksum;
///
/// // CMD_CONNECT, no session, reply id 0
/// let header = [0xe8, 0x03, 0, 0, 0, 0, 0, 0];
/// assert_eq!(checksum(&header), 65535 - 1000 - 1);
/// ```
pub fn checksum(buf: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = buf.chunks_exact(2);

    for word in &mut words {
        sum += u32::from(u16::from_le_bytes([word[0], word[1]]));
        sum %= USHRT_MAX;
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last);
        sum %= USHRT_MAX;
    }

    (USHRT_MAX - sum - 1) as u16
}

/// Payload of a `CMD_DATA_WRRQ` bulk-read request.
///
/// Layout: `01 | table (u16 LE) | fct (i32 LE) | ext (i32 LE)`.
pub fn read_buffer_request(table: CommandCode, fct: i32, ext: i32) -> Bytes {
    let mut buf = BytesMut::with_capacity(11);
    buf.put_u8(1);
    buf.put_u16_le(table.code());
    buf.put_i32_le(fct);
    buf.put_i32_le(ext);
    buf.freeze()
}

/// Payload of a `CMD_DATA_RDY` chunk request: `start (i32 LE) | size (i32 LE)`.
///
/// # Errors
/// - `Error::InvalidRecordData` if `start` or `size` does not fit an `i32`
pub fn chunk_request(start: usize, size: usize) -> Result<Bytes> {
    let field = |value: usize, name: &str| {
        i32::try_from(value).map_err(|_| {
            Error::invalid_record_data(format!("chunk {name} {value} exceeds i32 range"))
        })
    };

    let mut buf = BytesMut::with_capacity(8);
    buf.put_i32_le(field(start, "start")?);
    buf.put_i32_le(field(size, "size")?);
    Ok(buf.freeze())
}

/// Total transfer size announced in the reply to a bulk-read request.
///
/// The device answers `CMD_DATA_WRRQ` with a status byte followed by the
/// u32 LE size of the prepared buffer.
///
/// # Errors
/// - `Error::TruncatedPacket` if the size field is missing
/// - `Error::InvalidRecordData` if the size exceeds [`MAX_TABLE_SIZE`]
pub fn announced_size(data: &[u8]) -> Result<usize> {
    let size = match data.get(1..5) {
        Some(size) => u32::from_le_bytes([size[0], size[1], size[2], size[3]]) as usize,
        None => {
            return Err(Error::TruncatedPacket {
                length: data.len(),
                required: 5,
            });
        }
    };

    if size > MAX_TABLE_SIZE {
        return Err(Error::invalid_record_data(format!(
            "announced transfer of {size} bytes exceeds limit of {MAX_TABLE_SIZE}"
        )));
    }
    Ok(size)
}
