//! Process configuration.
//!
//! Every option is a command-line flag with an environment variable
//! fallback. `main` loads a `.env` file with `dotenvy` before parsing, so
//! the same variables can live there during development.
//!
//! | Flag                  | Environment                   | Default          |
//! |-----------------------|-------------------------------|------------------|
//! | `--host`              | `PUNCHGATE_HOST`              | `0.0.0.0`        |
//! | `--port`              | `PUNCHGATE_PORT`              | `3000`           |
//! | `--device-ip`         | `PUNCHGATE_DEVICE_IP`         | `192.168.13.201` |
//! | `--device-port`       | `PUNCHGATE_DEVICE_PORT`       | `4370`           |
//! | `--device-timeout-ms` | `PUNCHGATE_DEVICE_TIMEOUT_MS` | `5000`           |
//! | `--connection-mode`   | `PUNCHGATE_CONNECTION_MODE`   | `per-request`    |

use clap::{Parser, ValueEnum};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use punchgate_core::constants::{
    DEFAULT_DEVICE_IP, DEFAULT_DEVICE_PORT, DEFAULT_DEVICE_TIMEOUT_MS, DEFAULT_HTTP_HOST,
    DEFAULT_HTTP_PORT,
};
use punchgate_device::ZkClientConfig;

/// How device sessions are shared between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConnectionMode {
    /// Open and close a session for every request
    #[default]
    PerRequest,

    /// Keep one session open across requests, reopening it after a failure
    Persistent,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerRequest => f.write_str("per-request"),
            Self::Persistent => f.write_str("persistent"),
        }
    }
}

/// Command-line interface of the `punchgate` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "punchgate")]
#[command(about = "HTTP gateway for ZK attendance terminals")]
#[command(version)]
pub struct Cli {
    /// Address the HTTP server binds to
    #[arg(long, env = "PUNCHGATE_HOST", default_value = DEFAULT_HTTP_HOST)]
    pub host: String,

    /// Port the HTTP server listens on
    #[arg(long, env = "PUNCHGATE_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// IP address of the attendance device
    #[arg(long, env = "PUNCHGATE_DEVICE_IP", default_value = DEFAULT_DEVICE_IP)]
    pub device_ip: IpAddr,

    /// TCP port of the attendance device
    #[arg(long, env = "PUNCHGATE_DEVICE_PORT", default_value_t = DEFAULT_DEVICE_PORT)]
    pub device_port: u16,

    /// Timeout for each device socket operation, in milliseconds
    #[arg(
        long,
        env = "PUNCHGATE_DEVICE_TIMEOUT_MS",
        default_value_t = DEFAULT_DEVICE_TIMEOUT_MS
    )]
    pub device_timeout_ms: u64,

    /// Session strategy towards the device
    #[arg(
        long,
        env = "PUNCHGATE_CONNECTION_MODE",
        value_enum,
        default_value_t = ConnectionMode::PerRequest
    )]
    pub connection_mode: ConnectionMode,
}

/// Resolved gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub device: ZkClientConfig,
    pub connection_mode: ConnectionMode,
}

impl From<Cli> for GatewayConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            device: ZkClientConfig {
                device_addr: SocketAddr::new(cli.device_ip, cli.device_port),
                timeout: Duration::from_millis(cli.device_timeout_ms),
            },
            connection_mode: cli.connection_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["punchgate"]).unwrap();
        let config = GatewayConfig::from(cli);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.device.device_addr.to_string(), "192.168.13.201:4370");
        assert_eq!(config.device.timeout, Duration::from_millis(5000));
        assert_eq!(config.connection_mode, ConnectionMode::PerRequest);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "punchgate",
            "--host=127.0.0.1",
            "--port",
            "8080",
            "--device-ip",
            "10.1.2.3",
            "--device-port",
            "4371",
            "--device-timeout-ms",
            "750",
            "--connection-mode",
            "persistent",
        ])
        .unwrap();
        let config = GatewayConfig::from(cli);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.device.device_addr.to_string(), "10.1.2.3:4371");
        assert_eq!(config.device.timeout, Duration::from_millis(750));
        assert_eq!(config.connection_mode, ConnectionMode::Persistent);
    }

    #[test]
    fn test_invalid_device_ip_rejected() {
        assert!(Cli::try_parse_from(["punchgate", "--device-ip", "not-an-ip"]).is_err());
    }

    #[test]
    fn test_invalid_connection_mode_rejected() {
        assert!(Cli::try_parse_from(["punchgate", "--connection-mode", "pooled"]).is_err());
    }

    #[test]
    fn test_connection_mode_display() {
        assert_eq!(ConnectionMode::PerRequest.to_string(), "per-request");
        assert_eq!(ConnectionMode::Persistent.to_string(), "persistent");
    }
}
