//! Configuration module for relay-probe.
//!
//! The configuration file lists the applications exposed by the load
//! balancer. JSON is the native format; files ending in `.toml` are parsed
//! as TOML with the same keys.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "relay-probe")]
#[command(author = "relay-probe authors")]
#[command(version = "0.1.0")]
#[command(about = "Checks that a TCP load balancer relays echo traffic", long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(value_name = "CONFIG", default_value = "./config.json")]
    pub config: PathBuf,
}

/// One application fronted by the load balancer
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    /// Display name used in log lines
    pub name: String,
    /// Ports to validate, in order
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Backend addresses; carried for logging only
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Configuration file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    #[serde(default)]
    pub apps: Vec<AppConfig>,
    /// Host every port is dialed on
    #[serde(default = "default_host")]
    pub host: String,
    /// Upper bound for each connect and probe exchange, in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl Config {
    /// Load the configuration named on the command line.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();
        Self::from_path(&cli.config)
    }

    /// Read and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config: Config = if is_toml {
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))?
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| ConfigError::JsonParse(path.to_path_buf(), e))?
        };

        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.apps.is_empty() {
            return Err(ConfigError::NoApps(path.to_path_buf()));
        }
        for app in &self.apps {
            if app.ports.contains(&0) {
                return Err(ConfigError::InvalidPort(app.name.clone()));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    JsonParse(PathBuf, serde_json::Error),
    TomlParse(PathBuf, toml::de::Error),
    NoApps(PathBuf),
    InvalidPort(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::JsonParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::NoApps(path) => {
                write!(f, "No apps in config file '{}', nothing to validate", path.display())
            }
            ConfigError::InvalidPort(app) => {
                write!(f, "Application '{}' lists port 0", app)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
