//! Server configuration (webside.toml)
//!
//! Every field has a default, so an empty file (or no file at all) yields a server on
//! `127.0.0.1:9001` with CORS enabled and the sample objects pinned.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Complete server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebsideConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerSection,

    /// Session settings
    #[serde(default)]
    pub inspector: InspectorSection,
}

/// `[server]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Interface to bind (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (default: 9001)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Answer cross-origin requests (default: true)
    #[serde(default = "default_true")]
    pub cors: bool,
}

/// `[inspector]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectorSection {
    /// Pin the sample objects at start-up (default: true)
    #[serde(default = "default_true")]
    pub pin_samples: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9001
}

fn default_true() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
        }
    }
}

impl Default for InspectorSection {
    fn default() -> Self {
        Self { pin_samples: true }
    }
}

impl WebsideConfig {
    /// Load the configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse the configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: WebsideConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.server.host.trim();
        if host.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }
        if host.contains(char::is_whitespace) || host.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "server.host is not a host name or address: {:?}",
                self.server.host
            )));
        }
        Ok(())
    }

    /// `host:port` the listener binds
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host.trim(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = WebsideConfig::from_toml_str("").unwrap();
        assert_eq!(config, WebsideConfig::default());
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9001);
        assert!(config.server.cors);
        assert!(config.inspector.pin_samples);
    }

    #[test]
    fn test_partial_sections() {
        let config = WebsideConfig::from_toml_str(
            r#"
[server]
port = 9100

[inspector]
pin_samples = false
"#,
        )
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert!(!config.inspector.pin_samples);
    }

    #[test]
    fn test_invalid_host_rejected() {
        let err = WebsideConfig::from_toml_str("[server]\nhost = \"not a host\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        let err = WebsideConfig::from_toml_str("[server]\nhost = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = WebsideConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nhost = \"0.0.0.0\"\ncors = false").unwrap();
        let config = WebsideConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(!config.server.cors);
        assert_eq!(config.bind_address(), "0.0.0.0:9001");
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let example = include_str!("../../../webside.example.toml");
        let config = WebsideConfig::from_toml_str(example).unwrap();
        assert_eq!(config, WebsideConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = WebsideConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
