//! Configuration management for RyDrive
//!
//! Settings are layered: built-in defaults, then an optional `config.toml`,
//! then `RYDRIVE_*` environment variables. The resulting [`ServerConfig`] is
//! built once at startup and handed to the server by `Arc`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "RYDRIVE";

/// hyper refuses a connection read buffer smaller than this
const MIN_HEADER_BYTES: usize = 8192;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Host name or IP address to listen on
    pub bind_address: String,

    /// TCP port to listen on (0 lets the OS pick one)
    pub port: u16,

    /// Directory all client paths are confined to, created at startup
    pub storage_root: String,

    /// Largest accepted request body in MB; uploads are buffered in full
    pub max_upload_size_mb: u64,

    /// Chunk size used when streaming files to clients
    pub buffer_size: usize,

    /// Read buffer for one connection; bounds the request head (at least 8192)
    pub max_header_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost".to_string(),
            port: 8080,
            storage_root: "rydrive_data".to_string(),
            max_upload_size_mb: 512,
            buffer_size: 8192,
            max_header_bytes: 8192,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `./config.toml` (if present) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("storage_root", defaults.storage_root)?
            .set_default("max_upload_size_mb", defaults.max_upload_size_mb as i64)?
            .set_default("buffer_size", defaults.buffer_size as i64)?
            .set_default("max_header_bytes", defaults.max_header_bytes as i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.max_header_bytes < MIN_HEADER_BYTES {
            return Err(ConfigError::Message(format!(
                "max_header_bytes must be at least {}",
                MIN_HEADER_BYTES
            )));
        }

        Ok(())
    }

    /// Bind address and port as a `host:port` string
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Storage root as configured (not yet canonicalized)
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Maximum request body size in bytes
    pub fn max_body_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}
