//! Configuration management for ChainView

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{ExplorerError, Result};
use crate::explorer::DEFAULT_WINDOW_SIZE;

pub const DEFAULT_CONFIG_FILE: &str = "chainview.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for static files.
    #[serde(default = "default_www_root")]
    pub www_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-call limit in humantime syntax, e.g. `30s` or `1m 30s`.
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            www_root: default_www_root(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_www_root() -> String {
    "www".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:8545".to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

impl Config {
    /// Parse a TOML document and validate it.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node.endpoint.trim().is_empty() {
            return Err(ExplorerError::Config("node.endpoint must be set".to_string()));
        }
        if self.server.port == 0 {
            return Err(ExplorerError::Config("server.port must be non-zero".to_string()));
        }
        if self.explorer.window_size == 0 {
            return Err(ExplorerError::Config(
                "explorer.window_size must be at least 1".to_string(),
            ));
        }
        self.rpc_timeout()?;
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.node.timeout).map_err(|e| {
            ExplorerError::Config(format!("invalid node.timeout {:?}: {}", self.node.timeout, e))
        })
    }

    /// `host:port` the web server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file found, using defaults");
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }

    let contents = fs::read_to_string(path)?;
    Config::from_toml(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.node.endpoint, "http://localhost:8545");
        assert_eq!(config.explorer.window_size, 10);
        assert_eq!(config.rpc_timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [node]
            endpoint = "https://rpc.example.org"
            timeout = "1m 30s"
            "#,
        )
        .unwrap();

        assert_eq!(config.node.endpoint, "https://rpc.example.org");
        assert_eq!(config.rpc_timeout().unwrap(), Duration::from_secs(90));
        assert_eq!(config.server.www_root, "www");
        assert_eq!(config.explorer.window_size, 10);
    }

    #[test]
    fn test_validation_failures() {
        assert!(Config::from_toml("[explorer]\nwindow_size = 0").is_err());
        assert!(Config::from_toml("[node]\nendpoint = \"  \"").is_err());
        assert!(Config::from_toml("[node]\ntimeout = \"soon\"").is_err());
        assert!(Config::from_toml("[server]\nport = 0").is_err());
        assert!(Config::from_toml("[server\nport = 1").is_err());
    }

    #[test]
    fn test_load_from_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("chainview.toml");
        fs::write(&path, "[server]\nport = 9090\n[explorer]\nwindow_size = 25\n")?;

        let config = load_config(&path)?;
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.explorer.window_size, 25);

        let missing = load_config(&dir.path().join("absent.toml"))?;
        assert_eq!(missing.server.port, 8080);
        Ok(())
    }
}
