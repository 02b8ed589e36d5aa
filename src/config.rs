//! # Configuration Management
//!
//! Centralized configuration for CoIoT clients and listeners.
//!
//! This module provides structured configuration for the request client, the
//! broadcast listener and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Defaults
//! - Requests wait 1 second for a reply
//! - Listeners bind `0.0.0.0:5683` and join the CoAP multicast group `224.0.1.187`

use crate::core::options::{COAP_DEFAULT_PORT, COAP_MULTICAST_ADDRESS};
use crate::error::{ProtocolError, Result};
use crate::transport::RequestOptions;
use crate::utils::timeout::DEFAULT_REQUEST_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CoiotConfig {
    /// Client-specific configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Broadcast listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoiotConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("COIOT_CLIENT_HOST") {
            config.client.host = host;
        }

        if let Ok(port) = std::env::var("COIOT_CLIENT_PORT") {
            if let Ok(val) = port.parse::<u16>() {
                config.client.port = val;
            }
        }

        if let Ok(timeout) = std::env::var("COIOT_REQUEST_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.client.request_timeout = Duration::from_millis(val);
            }
        }

        if let Ok(addr) = std::env::var("COIOT_SERVER_ADDRESS") {
            config.server.bind_address = addr;
        }

        if let Ok(group) = std::env::var("COIOT_MULTICAST_ADDRESS") {
            config.server.multicast_address = group;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.client.validate());
        errors.extend(self.server.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Client-level request defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Device host name or IP address
    pub host: String,

    /// Device CoAP port
    pub port: u16,

    /// Timeout for waiting for a device reply
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,

    /// Retransmission count handed to the transport (transport default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_send: Option<u32>,

    /// Send confirmable (CON) requests
    pub confirmable: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: COAP_DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_send: None,
            confirmable: true,
        }
    }
}

impl ClientConfig {
    /// Client-level defaults for every request
    pub fn request_defaults(&self) -> RequestOptions {
        RequestOptions {
            host: Some(self.host.clone()),
            port: Some(self.port),
            confirmable: Some(self.confirmable),
            retry_send: self.retry_send,
            timeout: Some(self.request_timeout),
            ..RequestOptions::default()
        }
    }

    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push("Client host cannot be empty".to_string());
        }

        if self.port == 0 {
            errors.push("Client port must be greater than 0".to_string());
        }

        if self.request_timeout.as_millis() < 10 {
            errors.push("Request timeout too short (minimum: 10ms)".to_string());
        } else if self.request_timeout.as_secs() > 300 {
            errors.push("Request timeout too long (maximum: 300s)".to_string());
        }

        if let Some(retries) = self.retry_send {
            if retries > 10 {
                errors.push(format!(
                    "Retransmission count too high: {retries} (maximum: 10)"
                ));
            }
        }

        errors
    }
}

/// Broadcast listener configuration, consumed by the server transport
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Local bind address (e.g., "0.0.0.0:5683")
    pub bind_address: String,

    /// Multicast group to join for status broadcasts
    pub multicast_address: String,

    /// Interface to join the group on (all interfaces when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multicast_interface: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: format!("0.0.0.0:{COAP_DEFAULT_PORT}"),
            multicast_address: String::from(COAP_MULTICAST_ADDRESS),
            multicast_interface: None,
        }
    }
}

impl ServerConfig {
    /// Parsed bind address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind_address.parse().map_err(|_| {
            ProtocolError::ConfigError(format!("Invalid bind address: '{}'", self.bind_address))
        })
    }

    /// Parsed multicast group
    pub fn multicast_group(&self) -> Result<Ipv4Addr> {
        let group: Ipv4Addr = self.multicast_address.parse().map_err(|_| {
            ProtocolError::ConfigError(format!(
                "Invalid multicast address: '{}'",
                self.multicast_address
            ))
        })?;
        if !group.is_multicast() {
            return Err(ProtocolError::ConfigError(format!(
                "Address is not a multicast group: '{group}'"
            )));
        }
        Ok(group)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.bind_address.is_empty() {
            errors.push("Server bind address cannot be empty".to_string());
        } else if self.bind_addr().is_err() {
            errors.push(format!(
                "Invalid server bind address format: '{}' (expected format: '0.0.0.0:5683')",
                self.bind_address
            ));
        }

        if let Err(ProtocolError::ConfigError(message)) = self.multicast_group() {
            errors.push(message);
        }

        if let Some(ref interface) = self.multicast_interface {
            if interface.parse::<Ipv4Addr>().is_err() {
                errors.push(format!("Invalid multicast interface: '{interface}'"));
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("coiot-protocol"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
