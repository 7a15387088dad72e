//! Configuration file loading

use super::schema::Config;
use crate::error::{ProxyError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        // Priority order:
        // 1. $OUTPROXY_CONFIG
        // 2. $XDG_CONFIG_HOME/outproxy/config.toml
        // 3. ~/.config/outproxy/config.toml

        if let Ok(path) = env::var("OUTPROXY_CONFIG") {
            return PathBuf::from(path);
        }

        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("outproxy/config.toml");
        }

        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(".config/outproxy/config.toml");
        }

        PathBuf::from("config.toml")
    }

    /// Load config from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ProxyError::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Config> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load config with fallback to defaults
    pub fn load() -> Result<Config> {
        let path = Self::default_config_path();

        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Load config from an explicit path, or the default location.
    /// An explicit path that does not exist is an error.
    pub fn load_or_default(path: Option<PathBuf>) -> Result<Config> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Self::load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.listen, ":8080");
        assert_eq!(config.dial.timeout, "1s");
        assert!(!config.dial.ipv6);
        assert!(config.dial.deny_ranges.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3128"

[dial]
timeout = "250ms"
ipv6 = true
deny_ranges = ["100.64.0.0/10", "2001:db8::/32"]
"#;

        let config = ConfigLoader::parse(toml_str).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:3128");
        assert_eq!(config.dial.timeout, "250ms");
        assert!(config.dial.ipv6);
        assert_eq!(config.dial.deny_ranges.len(), 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ConfigLoader::parse("[dial]\nipv6 = true\n").unwrap();
        assert_eq!(config.server.listen, ":8080");
        assert_eq!(config.dial.timeout, "1s");
        assert!(config.dial.ipv6);
    }

    #[test]
    fn test_parse_error() {
        let result = ConfigLoader::parse("[dial]\nipv6 = \"maybe\"\n");
        assert!(matches!(result, Err(ProxyError::ConfigParse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten = \":9090\"").unwrap();

        let config = ConfigLoader::load_or_default(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.listen, ":9090");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_or_default(Some(dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ProxyError::ConfigLoad { .. })));
    }

    #[test]
    fn test_example_config_parses() {
        let config = ConfigLoader::parse(include_str!("../../outproxy.example.toml")).unwrap();
        assert_eq!(config.server.listen, ":8080");
        assert_eq!(config.dial.timeout, "1s");
    }
}
