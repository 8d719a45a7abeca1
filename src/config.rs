//! Configuration types for probe-server.
//!
//! Config is loaded once at startup from an optional TOML file. Every key has a
//! default, so an empty file (or no file at all) yields a working server on
//! port 8080 with a 20 second drain. Invalid values are rejected before any
//! port is opened.
//!
//! # Example
//! ```toml
//! [server]
//! port       = 8080
//! bind_addr  = "0.0.0.0"
//! drain_secs = 20
//! log_level  = "probe_server=debug"
//! log_format = "json"
//! ```

use std::{
    net::{IpAddr, SocketAddr},
    path::Path,
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Longest drain interval accepted. Orchestrators kill the pod long before this.
const MAX_DRAIN_SECS: u64 = 3600;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("parsing config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.server.port != 0, "[server] port must be non-zero");
        anyhow::ensure!(
            self.server.drain_secs <= MAX_DRAIN_SECS,
            "[server] drain_secs = {} exceeds the maximum of {}",
            self.server.drain_secs,
            MAX_DRAIN_SECS
        );
        Ok(())
    }
}

/// Listener and shutdown settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port for all three endpoints (default: 8080).
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Interface to bind (default: all IPv4 interfaces).
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: IpAddr,

    /// Seconds between failing readiness and exiting (default: 20).
    ///
    /// Should cover `periodSeconds * failureThreshold` of the readiness probe
    /// plus time for the endpoint list to propagate.
    #[serde(default = "defaults::drain_secs")]
    pub drain_secs: u64,

    /// Log filter override (`RUST_LOG` still wins when set).
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            bind_addr: defaults::bind_addr(),
            drain_secs: defaults::drain_secs(),
            log_level: None,
            log_format: LogFormat::default(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line, for log collectors.
    Json,
}

mod defaults {
    use std::net::{IpAddr, Ipv4Addr};

    pub fn port() -> u16 { 8080 }
    pub fn bind_addr() -> IpAddr { IpAddr::V4(Ipv4Addr::UNSPECIFIED) }
    pub fn drain_secs() -> u64 { 20 }
}
