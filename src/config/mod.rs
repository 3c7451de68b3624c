//! Configuration management
//!
//! Configuration is loaded from a `config.yml` file and then overridden by
//! `QUILL_*` environment variables. Missing values are filled with defaults,
//! except for the token signing secret which must be supplied.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by CORS (the front-end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL or SQLite file path
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/quill.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Sqlite,
    Mysql,
}

/// Bearer token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens. Empty means "not configured".
    #[serde(default)]
    pub secret: String,
    /// Token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_token_ttl_hours() -> i64 {
    24
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to and served from
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum accepted file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Accepted file extensions, lowercase without the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Prefix for returned URLs, e.g. `https://blog.example.com`
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
            public_base_url: None,
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl UploadConfig {
    /// Check an extension against the allow list, ignoring case and a leading dot
    pub fn is_extension_allowed(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        !ext.is_empty() && self.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }

    /// Public URL for a stored file name
    pub fn public_url(&self, filename: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/uploads/{}", base.trim_end_matches('/'), filename),
            None => format!("/uploads/{}", filename),
        }
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the default configuration. Invalid YAML
    /// is an error carrying the line and column of the problem.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// Recognised variables:
    /// - QUILL_SERVER_HOST, QUILL_SERVER_PORT, QUILL_SERVER_CORS_ORIGIN
    /// - QUILL_DATABASE_DRIVER, QUILL_DATABASE_URL
    /// - QUILL_AUTH_SECRET, QUILL_AUTH_TOKEN_TTL_HOURS
    /// - QUILL_UPLOAD_PATH, QUILL_UPLOAD_MAX_FILE_SIZE, QUILL_UPLOAD_PUBLIC_BASE_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.secret must be set (or QUILL_AUTH_SECRET)".to_string(),
            ));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.allowed_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        // Server
        if let Ok(host) = std::env::var("QUILL_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("QUILL_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("QUILL_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Database
        if let Ok(driver) = std::env::var("QUILL_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("QUILL_DATABASE_URL") {
            self.database.url = url;
        }

        // Auth
        if let Ok(secret) = std::env::var("QUILL_AUTH_SECRET") {
            self.auth.secret = secret;
        }
        if let Ok(ttl) = std::env::var("QUILL_AUTH_TOKEN_TTL_HOURS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                if ttl > 0 {
                    self.auth.token_ttl_hours = ttl;
                }
            }
        }

        // Upload
        if let Ok(path) = std::env::var("QUILL_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("QUILL_UPLOAD_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_file_size = size;
            }
        }
        if let Ok(base) = std::env::var("QUILL_UPLOAD_PUBLIC_BASE_URL") {
            self.upload.public_base_url = if base.is_empty() { None } else { Some(base) };
        }
    }
}

/// Format YAML parsing error with location
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Tests that touch the process environment share this lock.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
