//! HTTP/HTTPS forward proxy that refuses to dial local addresses

pub mod config;
pub mod error;
pub mod proxy;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, ConfigValidator, Overrides, Settings};
pub use error::{ProxyError, Result, ValidationError};
pub use proxy::{ProxyServer, ProxyServerConfig};
