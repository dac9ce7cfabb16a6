//! Configuration data structures.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files and to
//! `STRIDER__*` environment variables. Every field has a default so an empty
//! configuration is valid and serves on `0.0.0.0:8080` in debug mode.
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::core::dispatcher::DEFAULT_MAX_DEPTH;

/// Startup configuration of an application server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to listen on; `0` picks a free port.
    pub port: u16,
    /// Development mode: pretty logs and error details in 500 responses.
    pub debug: bool,
    /// Time allowed for in-flight requests once shutdown begins.
    pub shutdown_timeout_secs: u64,
    pub dispatch: DispatchConfig,
    pub request: RequestConfig,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            debug: true,
            shutdown_timeout_secs: 30,
            dispatch: DispatchConfig::default(),
            request: RequestConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// `host:port` as a string, e.g. `0.0.0.0:8080`.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.listen_addr().parse()
    }
}

/// Traversal settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum consecutive default-route steps once the path is exhausted.
    pub max_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Limits applied while reading requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequestConfig {
    /// Largest urlencoded form body that will be parsed, in bytes.
    pub max_form_bytes: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_form_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert!(config.debug);
        assert_eq!(config.dispatch.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_ipv6_listen_addr() {
        let config = ServerConfig {
            host: "::1".to_string(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(config.listen_addr(), "[::1]:9000");
        assert!(config.socket_addr().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.logging, LoggingConfig::default());
    }
}
