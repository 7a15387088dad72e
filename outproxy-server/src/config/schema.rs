//! Configuration schema types

use serde::{Deserialize, Serialize};

/// Complete proxy configuration as read from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dial: DialConfig,
}

/// Listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// `host:port`, or `:port` for every interface
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    ":8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Outbound dial settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DialConfig {
    /// Per-address connect timeout, e.g. "1s" or "250ms"
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Allow IPv6 destinations (local ones stay blocked)
    #[serde(default)]
    pub ipv6: bool,
    /// Extra CIDR ranges that are never dialed
    #[serde(default)]
    pub deny_ranges: Vec<String>,
}

fn default_timeout() -> String {
    "1s".to_string()
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            ipv6: false,
            deny_ranges: Vec::new(),
        }
    }
}

/// Values given on the command line. Set fields replace file values;
/// deny ranges are appended.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub timeout: Option<String>,
    pub ipv6: bool,
    pub deny_ranges: Vec<String>,
}

impl Config {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(listen) = overrides.listen {
            self.server.listen = listen;
        }
        if let Some(timeout) = overrides.timeout {
            self.dial.timeout = timeout;
        }
        self.dial.ipv6 |= overrides.ipv6;
        self.dial.deny_ranges.extend(overrides.deny_ranges);
    }
}
