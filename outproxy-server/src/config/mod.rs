//! Configuration management for proxy

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::ConfigLoader;
pub use schema::{Config, DialConfig, Overrides, ServerConfig};
pub use validator::{parse_duration, parse_listen_addr, ConfigValidator, Settings};
