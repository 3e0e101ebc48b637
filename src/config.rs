//! Configuration for the netkv server
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_EVICTION_INTERVAL;

/// Main configuration for a netkv server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Address to listen on
    pub address: String,

    /// Port to listen on
    pub port: u16,

    /// Per-request deadline; dispatches exceeding it are abandoned
    pub timeout: Duration,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Directory for the file back-end's value files
    pub cache_dir: PathBuf,

    /// Eviction worker tick period
    pub eviction_interval: Duration,

    // -------------------------------------------------------------------------
    // Snapshot Configuration
    // -------------------------------------------------------------------------
    /// Where the periodic dump is written; `None` disables snapshots
    pub init_file: Option<PathBuf>,

    /// How often the snapshot scheduler saves
    pub save_period: Duration,

    /// Save once and exit cleanly on the first interrupt
    pub save_on_interrupt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 2392,
            timeout: Duration::from_secs(60),
            cache_dir: PathBuf::from("./cache"),
            eviction_interval: DEFAULT_EVICTION_INTERVAL,
            init_file: None,
            save_period: Duration::from_millis(500),
            save_on_interrupt: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The `host:port` string the server binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn eviction_interval(mut self, interval: Duration) -> Self {
        self.config.eviction_interval = interval;
        self
    }

    pub fn init_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.init_file = Some(path.into());
        self
    }

    pub fn save_period(mut self, period: Duration) -> Self {
        self.config.save_period = period;
        self
    }

    pub fn save_on_interrupt(mut self, save: bool) -> Self {
        self.config.save_on_interrupt = save;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
