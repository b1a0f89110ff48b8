//! Configuration for the app layer.

use std::env;
use std::path::PathBuf;

/// Default seconds between periodic reconciliation passes.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 120;

/// App configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the remote recording/catalog API
    pub api_base_url: String,
    /// Directory for the key-value store and audio assets
    pub storage_dir: PathBuf,
    /// Seconds between periodic reconciliation passes
    pub sync_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration, reading a `.env` file if one exists.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = env::var("API_BASE_URL").map_err(|_| ConfigError::MissingApiBaseUrl)?;

        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./encore-data"));

        let sync_interval_secs = match env::var("SYNC_INTERVAL_SECS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidSyncInterval)?,
            Err(_) => DEFAULT_SYNC_INTERVAL_SECS,
        };

        Ok(Self {
            api_base_url,
            storage_dir,
            sync_interval_secs,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_BASE_URL environment variable is required")]
    MissingApiBaseUrl,

    #[error("Invalid SYNC_INTERVAL_SECS value")]
    InvalidSyncInterval,
}
