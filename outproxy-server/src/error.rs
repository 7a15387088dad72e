//! Error types for proxy operations

use outproxy::DialError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to load config from {path}: {source}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream dial failed: {0}")]
    Dial(#[from] DialError),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// True when the client sent something unusable, as opposed to an
    /// upstream failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProxyError::InvalidRequest(_)
                | ProxyError::Dial(DialError::InvalidAddress { .. })
                | ProxyError::Dial(DialError::UnsupportedNetwork(_))
        )
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid CIDR notation: {cidr}")]
    InvalidCidr { cidr: String },

    #[error("Invalid listen address: {addr}")]
    InvalidListenAddress { addr: String },

    #[error("Invalid duration: {value} (expected e.g. 500ms, 1s, 2m)")]
    InvalidDuration { value: String },

    #[error("Dial timeout must be greater than zero")]
    ZeroTimeout,
}
