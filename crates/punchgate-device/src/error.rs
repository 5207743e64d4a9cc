//! Error types for device sessions.
//!
//! Covers transport failures (timeouts, refused or dropped connections),
//! device-level refusals (unauthorized, negative acknowledgements) and
//! payloads the device returned in a shape that cannot be used.

use punchgate_protocol::CommandCode;

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors that can occur while talking to an attendance device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No session is open.
    #[error("Not connected to device")]
    NotConnected,

    /// Connection attempt timed out.
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out.
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out.
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during an operation.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Device requires a communication key.
    #[error("Device rejected the session: communication key required")]
    Unauthorized,

    /// Device answered a command with a negative acknowledgement.
    #[error("Device rejected {command}: replied {reply}")]
    Rejected {
        command: CommandCode,
        reply: CommandCode,
    },

    /// Device answered with a reply that does not fit the exchange.
    #[error("Unexpected reply to {command}: {reply}")]
    UnexpectedReply {
        command: CommandCode,
        reply: CommandCode,
    },

    /// Device returned data in an unusable shape.
    #[error("Invalid device response: {message}")]
    InvalidResponse { message: String },

    /// Protocol-level error from the codec or record decoding.
    #[error("Protocol error: {0}")]
    Protocol(punchgate_core::Error),

    /// Low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl DeviceError {
    /// Create a new invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Returns `true` if the device sent data the gateway cannot use.
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse { .. })
    }
}

impl From<punchgate_core::Error> for DeviceError {
    fn from(err: punchgate_core::Error) -> Self {
        match err {
            punchgate_core::Error::InvalidRecordData { message } => {
                Self::InvalidResponse { message }
            }
            punchgate_core::Error::Io(io) => Self::Io(io),
            other => Self::Protocol(other),
        }
    }
}
