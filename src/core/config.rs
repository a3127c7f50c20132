//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (and a `.env` file) or defaults.

use super::transport::TransportConfig;
use crate::backend::{ConnectionSettings, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// OPNsense connection used at startup.
    pub connection: ConnectionConfig,

    /// Capability group flags.
    pub plugins: PluginsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Startup connection to an OPNsense appliance.
///
/// When url, key and secret are all set the server starts configured, as if
/// `configure_connection` had been called with them.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub verify_ssl: bool,
    /// Per-request timeout, also applied to clients configured at runtime.
    pub timeout: Duration,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            api_secret: None,
            verify_ssl: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Connection settings, if url, key and secret are all present.
    pub fn settings(&self) -> Option<ConnectionSettings> {
        let url = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
        let secret = self.api_secret.as_deref().filter(|s| !s.is_empty())?;
        Some(
            ConnectionSettings::new(url.trim_end_matches('/'), key, secret, self.verify_ssl)
                .with_timeout(self.timeout),
        )
    }

    fn from_env() -> Self {
        let mut config = Self {
            url: std::env::var("OPNSENSE_URL").ok(),
            api_key: std::env::var("OPNSENSE_API_KEY").ok(),
            api_secret: std::env::var("OPNSENSE_API_SECRET").ok(),
            ..Self::default()
        };

        if let Ok(verify) = std::env::var("OPNSENSE_VERIFY_SSL") {
            config.verify_ssl = parse_flag(&verify).unwrap_or(true);
            if !config.verify_ssl {
                warn!("TLS certificate verification disabled for the startup connection");
            }
        }

        if let Ok(timeout) = std::env::var("OPNSENSE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(
                    "Ignoring invalid OPNSENSE_TIMEOUT_SECS '{}', using {}s",
                    timeout,
                    DEFAULT_TIMEOUT.as_secs()
                ),
            }
        }

        match (&config.url, config.settings()) {
            (Some(url), Some(_)) => info!("OPNsense connection loaded from environment: {}", url),
            (Some(_), None) => warn!(
                "OPNSENSE_URL is set but OPNSENSE_API_KEY / OPNSENSE_API_SECRET are missing - \
                 waiting for configure_connection"
            ),
            _ => {}
        }

        config
    }
}

/// Capability group flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Expose tools for optional plugin packages.
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "opnsense-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            connection: ConnectionConfig::default(),
            plugins: PluginsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix (`MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`, `MCP_ENABLE_PLUGINS`); the appliance connection uses
    /// `OPNSENSE_` (`OPNSENSE_URL`, `OPNSENSE_API_KEY`, ...).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(timestamps) = std::env::var("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = parse_flag(&timestamps).unwrap_or(true);
        }

        config.transport = TransportConfig::from_env();
        config.connection = ConnectionConfig::from_env();

        if let Ok(enabled) = std::env::var("MCP_ENABLE_PLUGINS") {
            config.plugins.enabled = parse_flag(&enabled).unwrap_or(false);
            info!("Plugin tools enabled: {}", config.plugins.enabled);
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
