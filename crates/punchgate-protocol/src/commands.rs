//! Command code definitions for the ZK attendance protocol.
//!
//! Every packet starts with a little-endian `u16` command code. Requests use
//! the low range (1..=1504), replies use the `CMD_ACK_*` range (2000..) and a
//! handful of `0xFFxx` error codes.
//!
//! Only the commands needed to open a session, bulk-read the user and
//! attendance tables, and close the session are modelled.
//!
//! # Request / Reply Pairs
//!
//! | Request | Code | Typical reply |
//! |---------|------|---------------|
//! | `Connect` | 1000 | `AckOk` (carries session id) or `AckUnauth` |
//! | `Exit` | 1001 | `AckOk` |
//! | `ReadBuffer` (`CMD_DATA_WRRQ`) | 1503 | `Data` (inline) or `AckOk`/`PrepareData` (size) |
//! | `ReadyChunk` (`CMD_DATA_RDY`) | 1504 | `Data`, or `PrepareData` + `Data`… + `AckOk` |
//! | `FreeData` | 1502 | `AckOk` |
//!
//! # Examples
//!
//! ```
//! use punchgate_protocol::CommandCode;
//!
//! let cmd = CommandCode::parse(2000).unwrap();
//! assert_eq!(cmd, CommandCode::AckOk);
//! assert_eq!(CommandCode::Connect.code(), 1000);
//! assert!(CommandCode::parse(4242).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use punchgate_core::{Error, Result};

/// Command codes for ZK protocol packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandCode {
    // Table selectors used inside bulk-read requests
    UserTable,       // 9
    AttendanceTable, // 13

    // Session
    Connect,       // 1000
    Exit,          // 1001
    EnableDevice,  // 1002
    DisableDevice, // 1003

    // Bulk transfer
    PrepareData, // 1500
    Data,        // 1501
    FreeData,    // 1502
    ReadBuffer,  // 1503
    ReadyChunk,  // 1504

    // Replies
    AckOk,        // 2000
    AckError,     // 2001
    AckData,      // 2002
    AckRetry,     // 2003
    AckRepeat,    // 2004
    AckUnauth,    // 2005
    AckErrorData, // 0xFFFB
    AckErrorInit, // 0xFFFC
    AckErrorCmd,  // 0xFFFD
    AckUnknown,   // 0xFFFF
}

impl CommandCode {
    pub fn parse(code: u16) -> Result<Self> {
        match code {
            9 => Ok(CommandCode::UserTable),
            13 => Ok(CommandCode::AttendanceTable),
            1000 => Ok(CommandCode::Connect),
            1001 => Ok(CommandCode::Exit),
            1002 => Ok(CommandCode::EnableDevice),
            1003 => Ok(CommandCode::DisableDevice),
            1500 => Ok(CommandCode::PrepareData),
            1501 => Ok(CommandCode::Data),
            1502 => Ok(CommandCode::FreeData),
            1503 => Ok(CommandCode::ReadBuffer),
            1504 => Ok(CommandCode::ReadyChunk),
            2000 => Ok(CommandCode::AckOk),
            2001 => Ok(CommandCode::AckError),
            2002 => Ok(CommandCode::AckData),
            2003 => Ok(CommandCode::AckRetry),
            2004 => Ok(CommandCode::AckRepeat),
            2005 => Ok(CommandCode::AckUnauth),
            0xFFFB => Ok(CommandCode::AckErrorData),
            0xFFFC => Ok(CommandCode::AckErrorInit),
            0xFFFD => Ok(CommandCode::AckErrorCmd),
            0xFFFF => Ok(CommandCode::AckUnknown),
            _ => Err(Error::InvalidCommandCode { code }),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            CommandCode::UserTable => 9,
            CommandCode::AttendanceTable => 13,
            CommandCode::Connect => 1000,
            CommandCode::Exit => 1001,
            CommandCode::EnableDevice => 1002,
            CommandCode::DisableDevice => 1003,
            CommandCode::PrepareData => 1500,
            CommandCode::Data => 1501,
            CommandCode::FreeData => 1502,
            CommandCode::ReadBuffer => 1503,
            CommandCode::ReadyChunk => 1504,
            CommandCode::AckOk => 2000,
            CommandCode::AckError => 2001,
            CommandCode::AckData => 2002,
            CommandCode::AckRetry => 2003,
            CommandCode::AckRepeat => 2004,
            CommandCode::AckUnauth => 2005,
            CommandCode::AckErrorData => 0xFFFB,
            CommandCode::AckErrorInit => 0xFFFC,
            CommandCode::AckErrorCmd => 0xFFFD,
            CommandCode::AckUnknown => 0xFFFF,
        }
    }

    /// Returns `true` if this code is a negative acknowledgement.
    ///
    /// # Example
    /// ```
    /// use punchgate_protocol::CommandCode;
    ///
    /// assert!(CommandCode::AckError.is_error_reply());
    /// assert!(CommandCode::AckErrorCmd.is_error_reply());
    /// assert!(!CommandCode::AckOk.is_error_reply());
    /// ```
    #[inline]
    pub fn is_error_reply(&self) -> bool {
        matches!(
            self,
            CommandCode::AckError
                | CommandCode::AckErrorData
                | CommandCode::AckErrorInit
                | CommandCode::AckErrorCmd
                | CommandCode::AckUnknown
        )
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

impl TryFrom<u16> for CommandCode {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self> {
        Self::parse(code)
    }
}
