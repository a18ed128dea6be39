//! Application configuration loaded from environment variables.

use std::fmt;

use serde::Deserialize;
use strum::{AsRefStr, EnumString};

/// Deployment mode label. Affects the startup log line and log format only.
///
/// Any label is accepted; unrecognised ones are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    /// Local development (default).
    #[default]
    Development,
    /// Production deployment.
    Production,
    /// Test runs.
    Test,
    /// Any other label, e.g. "staging".
    #[strum(default)]
    Other(String),
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Other(label) => f.write_str(label),
            known => f.write_str(known.as_ref()),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment mode label. Takes precedence over `node_env`.
    #[serde(default)]
    pub app_env: Option<String>,

    /// Deployment mode label read for compatibility with Node deployments.
    #[serde(default)]
    pub node_env: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Metrics ===
    /// Port for the Prometheus scrape endpoint. Disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            app_env: None,
            node_env: None,
            rust_log: default_log_level(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be greater than 0".to_string());
        }

        if self.metrics_port == Some(self.port) {
            return Err("METRICS_PORT must differ from PORT".to_string());
        }

        Ok(())
    }

    /// Effective deployment mode: `APP_ENV`, then `NODE_ENV`, then development.
    pub fn environment(&self) -> Environment {
        self.app_env
            .as_deref()
            .or(self.node_env.as_deref())
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(|label| {
                label
                    .parse()
                    .unwrap_or_else(|_| Environment::Other(label.to_string()))
            })
            .unwrap_or_default()
    }

    /// Whether running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment() == Environment::Production
    }
}
