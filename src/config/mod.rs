use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Prefix for every environment variable read by the service
pub const ENV_PREFIX: &str = "CAFETERIA";

pub(crate) const DEVELOPMENT_SECRET_KEY: &str = "cafeteria-development-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
    /// Comma-separated list of accepted image extensions
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: String,
    #[serde(default)]
    pub assets_base_url: String,
}

#[derive(Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    #[serde(default = "default_csrf_time_limit")]
    pub csrf_time_limit_seconds: u64,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &"<redacted>")
            .field("csrf_time_limit_seconds", &self.csrf_time_limit_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

impl Config {
    /// Load every section from `CAFETERIA_*` environment variables and validate
    pub fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load configuration: {}", e),
            })?;

        Self::from_settings(&settings)
    }

    /// Build from already-collected settings
    pub fn from_settings(settings: &config::Config) -> Result<Self, ConfigError> {
        let config = Config {
            server: section(settings, "server")?,
            database: section(settings, "database")?,
            storage: section(settings, "storage")?,
            security: section(settings, "security")?,
            observability: section(settings, "observability")?,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating configuration");

        if self.server.port == 0 {
            return Err(validation_error("Server port cannot be 0"));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(validation_error("Request timeout cannot be 0"));
        }

        if self.server.max_request_size == 0 {
            return Err(validation_error("Max request size cannot be 0"));
        }

        if self.database.database_url.trim().is_empty() {
            return Err(validation_error("Database URL cannot be empty"));
        }

        if !is_sql_identifier(&self.database.table_name) {
            return Err(validation_error(
                "Table name must start with a letter and contain only letters, digits and underscores",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(validation_error("Max connections cannot be 0"));
        }

        for (name, value) in [
            ("Upload directory", &self.storage.upload_dir),
            ("Static directory", &self.storage.static_dir),
            ("Templates directory", &self.storage.templates_dir),
        ] {
            if value.trim().is_empty() {
                return Err(validation_error(&format!("{} cannot be empty", name)));
            }
        }

        if self.storage.allowed_extensions().is_empty() {
            return Err(validation_error("At least one image extension must be allowed"));
        }

        if self.security.secret_key.is_empty() {
            return Err(validation_error("Secret key cannot be empty"));
        }

        if self.security.csrf_time_limit_seconds == 0 {
            return Err(validation_error("CSRF time limit cannot be 0"));
        }

        if self.security.uses_development_secret() {
            warn!("Using the development secret key; set CAFETERIA_SECRET_KEY in production");
        }

        info!("Configuration validation completed");
        Ok(())
    }
}

fn section<T: DeserializeOwned>(settings: &config::Config, name: &str) -> Result<T, ConfigError> {
    settings
        .clone()
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", name, e),
        })
}

fn validation_error(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}

pub(crate) fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl StorageConfig {
    /// Allowed extensions, lowercased and without leading dots
    pub fn allowed_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    pub fn upload_path(&self) -> PathBuf {
        PathBuf::from(&self.upload_dir)
    }
}

impl SecurityConfig {
    pub fn uses_development_secret(&self) -> bool {
        self.secret_key == DEVELOPMENT_SECRET_KEY
    }

    pub fn csrf_time_limit(&self) -> Duration {
        Duration::from_secs(self.csrf_time_limit_seconds)
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    16 * 1024 * 1024 // 16MB
}

pub(crate) fn default_database_url() -> String {
    "sqlite://cafeteria.db".to_string()
}

pub(crate) fn default_table_name() -> String {
    "menu_items".to_string()
}

pub(crate) fn default_max_connections() -> u32 {
    5
}

pub(crate) fn default_upload_dir() -> String {
    "static/uploads".to_string()
}

pub(crate) fn default_static_dir() -> String {
    "static".to_string()
}

pub(crate) fn default_templates_dir() -> String {
    "templates".to_string()
}

pub(crate) fn default_allowed_extensions() -> String {
    "png,jpg,jpeg,gif".to_string()
}

pub(crate) fn default_secret_key() -> String {
    DEVELOPMENT_SECRET_KEY.to_string()
}

pub(crate) fn default_csrf_time_limit() -> u64 {
    3600
}

pub(crate) fn default_service_name() -> String {
    "cafeteria-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
