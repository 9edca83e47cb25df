use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding `{locator}` and `{locator}.gz` files.
    pub root: PathBuf,
    /// Upper bound for a single upload, in bytes.
    pub max_upload_size: u64,
    /// gzip level for compressed mirrors (0-9).
    pub compression_level: u32,
}

/// What the recompress pass does when one file fails.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop at the first failure.
    #[default]
    Abort,
    /// Log the failure and move on to the next file.
    Continue,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MaintenanceConfig {
    /// Re-detect MIME types and rebuild compressed mirrors before serving.
    pub recompress_on_startup: bool,
    pub on_error: OnError,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub maintenance: MaintenanceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("storage.root", "./data/files")?
            .set_default("storage.max_upload_size", 128 * 1024 * 1024)?
            .set_default("storage.compression_level", 6)?
            .set_default("maintenance.recompress_on_startup", false)?
            .set_default("maintenance.on_error", "abort")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., UPLOADER__DATABASE__URL)
            .add_source(
                Environment::with_prefix("UPLOADER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
