use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::tftp::core::Mode;

/// Port used when neither the config file nor the command line names one
pub const DEFAULT_PORT: u16 = 3333;

/// TFTP client configuration
///
/// Values come from the built-in defaults, optionally overridden by a TOML
/// file, then by command-line flags.
///
/// ```toml
/// server = "192.168.1.100"
/// port = 69
/// timeout = "5s"
/// retries = 5
/// mode = "octet"
/// ```
///
/// # Example
///
/// ```rust
/// use tftpc::tftp::client::ClientConfig;
///
/// let config = ClientConfig::new("192.168.1.100", 69);
/// assert_eq!(config.retries, 5);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub server: String,
    /// Server port number
    pub port: u16,
    /// How long to wait for each reply
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Retransmissions of one packet before giving up
    pub retries: u32,
    /// Transfer mode
    pub mode: Mode,
}

impl ClientConfig {
    /// Create new client configuration
    ///
    /// # Arguments
    ///
    /// * `server` - Server host name or IP address
    /// * `port` - Server port number
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            timeout: Duration::from_secs(5),
            retries: 5,
            mode: Mode::Octet,
        }
    }

    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than zero");
        }
        Ok(config)
    }

    /// Apply command-line overrides; `None` keeps the current value
    pub fn merge_cli(
        mut self,
        server: Option<String>,
        port: Option<u16>,
        timeout: Option<Duration>,
        retries: Option<u32>,
        mode: Option<Mode>,
    ) -> Self {
        if let Some(server) = server {
            self.server = server;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(timeout) = timeout {
            self.timeout = timeout;
        }
        if let Some(retries) = retries {
            self.retries = retries;
        }
        if let Some(mode) = mode {
            self.mode = mode;
        }
        self
    }

    /// Set timeout duration
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retransmission budget
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set transfer mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT)
    }
}
