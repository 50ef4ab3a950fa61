//! Configuration for iq-bridge
//!
//! Defaults reproduce a local goesrecv setup: samples published on
//! `127.0.0.1:5000`, RTL_TCP clients served on port 1234. Everything can be
//! loaded from a TOML file and then overridden from the command line.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub downstream: DownstreamConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// goesrecv sample publisher settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Publisher host (default: 127.0.0.1)
    #[serde(default = "default_upstream_host")]
    pub host: String,

    /// Publisher I/Q sample port (default: 5000)
    #[serde(default = "default_upstream_port")]
    pub port: u16,

    /// Connect timeout in milliseconds, 0 blocks indefinitely (default: 0)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Subscribe acknowledgement timeout in milliseconds, 0 blocks indefinitely (default: 0)
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    /// Receive buffer size in bytes (default: 65536)
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// RTL_TCP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownstreamConfig {
    /// Port RTL_TCP clients connect to (default: 1234)
    #[serde(default = "default_downstream_port")]
    pub port: u16,
}

/// Strategy used between sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    /// Start the next session right away
    #[default]
    Immediate,
    /// Exponential delay between failed sessions, capped at `max_delay_ms`
    Backoff,
}

/// Session restart settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// First backoff delay in milliseconds (default: 250)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff ceiling in milliseconds (default: 10000)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Print error details for troubleshooting
    #[serde(default)]
    pub debug: bool,
}

fn default_upstream_host() -> String {
    "127.0.0.1".to_string()
}
fn default_upstream_port() -> u16 {
    5000
}
fn default_connect_timeout_ms() -> u64 {
    0
}
fn default_handshake_timeout_ms() -> u64 {
    0
}
fn default_read_buffer_size() -> usize {
    65536
}
fn default_downstream_port() -> u16 {
    1234
}
fn default_initial_delay_ms() -> u64 {
    250
}
fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: default_upstream_host(),
            port: default_upstream_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            port: default_downstream_port(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::default(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl UpstreamConfig {
    /// `host:port` string of the publisher
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and keys fall back to their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
        let config: BridgeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never produce a working session
    pub fn validate(&self) -> Result<()> {
        if self.upstream.host.trim().is_empty() {
            return Err(Error::Config("upstream host is empty".to_string()));
        }
        if self.upstream.port == 0 {
            return Err(Error::Config("upstream port must be non-zero".to_string()));
        }
        if self.upstream.read_buffer_size < 8 {
            return Err(Error::Config(format!(
                "read buffer of {} bytes cannot hold a frame header",
                self.upstream.read_buffer_size
            )));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(Error::Config(format!(
                "retry initial delay {}ms exceeds max delay {}ms",
                self.retry.initial_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Default log filter for env_logger
    pub fn log_level(&self) -> &'static str {
        if self.logging.debug { "debug" } else { "info" }
    }
}
