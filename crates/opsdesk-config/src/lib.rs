//! Configuration management for opsdesk
//!
//! This module handles loading, validation, and management of
//! opsdesk configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

/// Remote REST API the back office operates on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL including the API prefix, e.g. `http://127.0.0.1:5000/api/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request. Never echoed back by the settings API.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Realtime channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Connect the realtime hub on start-up
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Quiet window before a burst of events turns into one refresh
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Events that invalidate the member list
    #[serde(default = "default_member_events")]
    pub member_events: Vec<String>,
    /// Events that invalidate the product list
    #[serde(default)]
    pub product_events: Vec<String>,
    /// Events that invalidate the withdrawal list
    #[serde(default)]
    pub withdrawal_events: Vec<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
            member_events: default_member_events(),
            product_events: Vec::new(),
            withdrawal_events: Vec::new(),
        }
    }
}

impl RealtimeConfig {
    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_member_events() -> Vec<String> {
    [
        "connect",
        "user_status_update",
        "online_users",
        "user_connected",
        "user_disconnected",
        "users_online",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pagination settings shared by every list view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page sizes offered in the page-size selector
    #[serde(default = "default_page_sizes")]
    pub page_sizes: Vec<u32>,
    /// Page size used when a list is mounted
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Number of slots (page buttons and ellipses) in the pager
    #[serde(default = "default_max_visible_pages")]
    pub max_visible_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_sizes: default_page_sizes(),
            default_limit: default_limit(),
            max_visible_pages: default_max_visible_pages(),
        }
    }
}

fn default_page_sizes() -> Vec<u32> {
    vec![10, 20, 50, 100]
}

fn default_limit() -> u32 {
    10
}

fn default_max_visible_pages() -> u32 {
    7
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote API settings
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Realtime channel settings
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|_| ConfigError::IoError)?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        let base_url = self.remote.base_url.trim();
        // The client speaks plain HTTP; TLS is terminated in front of the API
        if !base_url.starts_with("http://") {
            return Err(ConfigError::InvalidValue {
                field: "remote.base_url".to_string(),
                reason: "Base URL must start with http://".to_string(),
            });
        }

        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "remote.timeout_secs".to_string(),
                reason: "Timeout must be at least one second".to_string(),
            });
        }

        if self.realtime.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "realtime.debounce_ms".to_string(),
                reason: "Debounce window must be greater than 0".to_string(),
            });
        }

        if self.pagination.page_sizes.is_empty() {
            return Err(ConfigError::MissingField {
                field: "pagination.page_sizes".to_string(),
            });
        }

        if self.pagination.page_sizes.contains(&0) {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_sizes".to_string(),
                reason: "Page sizes must be greater than 0".to_string(),
            });
        }

        if !self
            .pagination
            .page_sizes
            .contains(&self.pagination.default_limit)
        {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_limit".to_string(),
                reason: "Default limit must be one of pagination.page_sizes".to_string(),
            });
        }

        if self.pagination.max_visible_pages < 5 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.max_visible_pages".to_string(),
                reason: "The pager needs at least 5 slots".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Bind address for the HTTP server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ==================== Tests ====================
