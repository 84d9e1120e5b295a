//! Configuration for MailPulse

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "MAILPULSE_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Tracking endpoint configuration
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Outbound SMTP configuration
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address string to bind the HTTP listener to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database backend: "postgres" or "memory"
    #[serde(default = "default_db_backend")]
    pub backend: String,

    /// Database URL (for postgres)
    pub url: Option<String>,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_db_backend(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_db_backend() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// Tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Public base URL embedded in pixel and click links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of events returned by the recent activity feed
    #[serde(default = "default_recent_events_limit")]
    pub recent_events_limit: i64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            recent_events_limit: default_recent_events_limit(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_recent_events_limit() -> i64 {
    50
}

/// Outbound SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay host
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Relay port
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Username for relay authentication
    pub username: Option<String>,

    /// Password for relay authentication
    pub password: Option<String>,

    /// Use implicit TLS
    #[serde(default)]
    pub use_tls: bool,

    /// Use STARTTLS
    #[serde(default = "default_use_starttls")]
    pub use_starttls: bool,

    /// Transmission timeout in seconds
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            use_tls: false,
            use_starttls: default_use_starttls(),
            timeout_secs: default_smtp_timeout(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_starttls() -> bool {
    true
}

fn default_smtp_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level / filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info,mailpulse=debug".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `MAILPULSE_CONFIG` or the default locations
    pub fn load() -> crate::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let paths = [
            PathBuf::from("./mailpulse.toml"),
            PathBuf::from("./config.toml"),
            PathBuf::from("/etc/mailpulse/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> crate::Result<()> {
        match self.database.backend.as_str() {
            "postgres" if self.database.url.is_none() => Err(crate::Error::Config(
                "Database URL required for PostgreSQL".to_string(),
            )),
            "postgres" | "memory" => Ok(()),
            other => Err(crate::Error::Config(format!(
                "Unsupported database backend: {}",
                other
            ))),
        }?;

        if self.tracking.recent_events_limit <= 0 {
            return Err(crate::Error::Config(
                "tracking.recent_events_limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
