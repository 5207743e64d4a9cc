//! Device access layer for punchgate.
//!
//! This crate provides the collaborator the gateway talks to: a pair of
//! traits describing a device session, a TCP client for ZK attendance
//! terminals implementing them, and an in-memory mock device.
//!
//! # Components
//!
//! - **[`DeviceConnector`] / [`DeviceSession`]**: open a session, read one
//!   table, close the session
//! - **[`ZkClient`] / [`ZkConnector`]**: ZK protocol over TCP port 4370
//! - **[`MockDevice`]**: scripted device with session counters (feature `mock`)
//!
//! # Example
//!
//! ```no_run
//! use punchgate_device::{DeviceConnector, DeviceSession, ZkClientConfig, ZkConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = ZkConnector::new(ZkClientConfig::default());
//!
//! let mut session = connector.connect().await?;
//! let users = session.get_users().await?;
//! session.disconnect().await?;
//!
//! println!("{} users enrolled", users.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod traits;

mod client;

#[cfg(feature = "mock")]
pub mod mock;

pub use client::{ZkClient, ZkClientConfig, ZkConnector};
pub use error::{DeviceError, Result};
pub use traits::{DeviceConnector, DeviceSession};

#[cfg(feature = "mock")]
pub use mock::{MockDevice, MockSession, MockStats};
