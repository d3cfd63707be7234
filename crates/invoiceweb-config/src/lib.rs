//! Configuration management for invoiceweb
//!
//! This module handles loading, validation, and management of
//! invoiceweb configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

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
    /// Login credentials for the memory data source (optional)
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8082
}

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// Where list views fetch their records from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// In-process store seeded from a fixture file
    #[default]
    Memory,
    /// Remote REST API
    Remote,
}

impl std::str::FromStr for SourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(SourceKind::Memory),
            "remote" => Ok(SourceKind::Remote),
            _ => Err(format!("Invalid data source: {}", s)),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Memory => write!(f, "memory"),
            SourceKind::Remote => write!(f, "remote"),
        }
    }
}

/// Data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub source: SourceKind,
    /// Fixture file seeding the memory store
    #[serde(default = "default_fixtures")]
    pub fixtures: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Memory,
            fixtures: default_fixtures(),
        }
    }
}

fn default_fixtures() -> PathBuf {
    PathBuf::from("./data/fixtures.yaml")
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the JWT login endpoint
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Path of the account creation endpoint
    #[serde(default = "default_register_path")]
    pub register_path: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            register_path: default_register_path(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_login_path() -> String {
    "/api/login_check".to_string()
}

fn default_register_path() -> String {
    "/api/users".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page for lists
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
        }
    }
}

fn default_items_per_page() -> usize {
    10
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a fetched collection stays fresh
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    15 * 60
}

/// Toast position on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToastPosition {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

impl ToastPosition {
    /// CSS utility classes placing the toast container
    pub fn css(&self) -> &'static str {
        match self {
            ToastPosition::TopLeft => "top-4 left-4",
            ToastPosition::TopRight => "top-4 right-4",
            ToastPosition::BottomLeft => "bottom-4 left-4",
            ToastPosition::BottomRight => "bottom-4 right-4",
        }
    }
}

/// Toast notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub position: ToastPosition,
    /// Milliseconds before a toast closes itself
    #[serde(default = "default_auto_close_ms")]
    pub auto_close_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            position: ToastPosition::BottomLeft,
            auto_close_ms: default_auto_close_ms(),
        }
    }
}

fn default_auto_close_ms() -> u64 {
    3000
}

/// List view behaviour
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ViewConfig {
    /// Clear the loading flag when the first fetch fails.
    /// Off by default: the view keeps showing its loader until a reload.
    #[serde(default)]
    pub clear_loading_on_failure: bool,
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
    #[serde(default = "default_decimal_sep")]
    pub decimal_separator: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
            decimal_separator: default_decimal_sep(),
        }
    }
}

fn default_symbol() -> String {
    "€".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    " ".to_string()
}

fn default_decimal_sep() -> String {
    ",".to_string()
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

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError,
        })?;

        let config = Self::from_yaml(&content)?;
        log::debug!(target: "invoiceweb::config", "Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.pagination.items_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.items_per_page".to_string(),
                reason: "Page size must be greater than 0".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if self.data.source == SourceKind::Remote
            && !self.api.base_url.starts_with("http://")
        {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: "Base URL must start with http://; TLS is not supported".to_string(),
            });
        }

        Ok(())
    }

    /// Default configuration file contents
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Page size shared by every list view
    pub fn page_size(&self) -> usize {
        self.pagination.items_per_page
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.pagination.items_per_page, 10);
        assert_eq!(config.cache.ttl_secs, 900);
        assert_eq!(config.notifications.auto_close_ms, 3000);
        assert_eq!(config.notifications.position, ToastPosition::BottomLeft);
        assert_eq!(config.data.source, SourceKind::Memory);
        assert!(!config.view.clear_loading_on_failure);
        assert_eq!(config.api.register_path, "/api/users");
    }

    #[test]
    fn test_generated_default_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.page_size(), 10);
        assert!(config.server.auth.is_some());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = Config::from_yaml("pagination:\n  items_per_page: 0\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "pagination.items_per_page"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remote_requires_http_url() {
        let yaml = "data:\n  source: remote\napi:\n  base_url: localhost:8000\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("server: [").unwrap_err();
        assert_eq!(err.code(), error::ConfigErrorCode::InvalidYaml);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/invoiceweb.yaml").unwrap_err();
        assert_eq!(err.code(), error::ConfigErrorCode::FileNotFound);
        assert!(!err.to_details().suggestions.is_empty());
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("REMOTE".parse::<SourceKind>(), Ok(SourceKind::Remote));
        assert!("ftp".parse::<SourceKind>().is_err());
        assert_eq!(SourceKind::Memory.to_string(), "memory");
    }
}
