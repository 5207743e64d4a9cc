//! HTTP gateway for ZK attendance terminals.
//!
//! Re-exposes two device operations as JSON endpoints:
//!
//! - `GET /users`: the enrolled users
//! - `GET /logs?from=&to=&userId=`: attendance punches, filtered in memory
//!
//! Each request runs `connect (one retry) → device call → disconnect` through
//! a [`ConnectionManager`], which keeps at most one device session in flight.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use punchgate_device::{ZkClientConfig, ZkConnector};
//! use punchgate_server::{ConnectionManager, ConnectionMode, routes};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let connector = ZkConnector::new(ZkClientConfig::default());
//! let manager = Arc::new(ConnectionManager::new(connector, ConnectionMode::PerRequest));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, routes::app(manager)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod manager;
pub mod routes;

pub use config::{Cli, ConnectionMode, GatewayConfig};
pub use error::{GatewayError, GatewayResult};
pub use filter::{LogFilter, LogQuery};
pub use manager::ConnectionManager;
