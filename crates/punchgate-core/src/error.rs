use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Framing errors
    #[error("Invalid frame magic: {found:02x?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("Frame too large: {size} bytes (max {max_size})")]
    FrameTooLarge { size: usize, max_size: usize },

    #[error("Truncated packet: {length} bytes, need at least {required}")]
    TruncatedPacket { length: usize, required: usize },

    // Protocol errors
    #[error("Invalid command code: {code}")]
    InvalidCommandCode { code: u16 },

    #[error("Invalid record data: {message}")]
    InvalidRecordData { message: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new invalid record data error.
    pub fn invalid_record_data(message: impl Into<String>) -> Self {
        Self::InvalidRecordData {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
