//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_JAMAI_BASE_URL: &str = "https://api.jamaibase.com";
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_PROFILE_COLLECTION: &str = "users";

/// Paths to the server's data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Staging directory for uploaded files (`data/uploads/`).
    pub uploads: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            uploads: root.join("uploads"),
            root,
        };
        std::fs::create_dir_all(&paths.uploads)?;
        Ok(paths)
    }
}

/// Credentials and endpoint for the AI table service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableServiceConfig {
    pub base_url: String,
    pub project_id: String,
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl TableServiceConfig {
    /// `JAMAI_BASE_URL`, `PROJECT_ID` and `JAMAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_or("JAMAI_BASE_URL", DEFAULT_JAMAI_BASE_URL),
            project_id: required_env("PROJECT_ID")?,
            api_key: required_env("JAMAI_API_KEY")?,
        })
    }
}

/// Endpoint and collection for the profile document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub collection: String,
    /// Bearer token for the REST API; `None` for emulators and open rules.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_or("FIRESTORE_BASE_URL", DEFAULT_FIRESTORE_BASE_URL),
            project_id: required_env("FIRESTORE_PROJECT_ID")?,
            collection: env_or("FIRESTORE_COLLECTION", DEFAULT_PROFILE_COLLECTION),
            access_token: std::env::var("FIRESTORE_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
        })
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotiPlantaConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub table: TableServiceConfig,
    pub store: StoreConfig,
    /// Open CORS to every origin.
    pub cors_enabled: bool,
}

impl RotiPlantaConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_paths = DataPaths::new(data_dir)?;

        let table = TableServiceConfig::from_env()?;
        let store = StoreConfig::from_env()?;

        let cors_enabled = std::env::var("CORS_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Self {
            port,
            data_paths,
            table,
            store,
            cors_enabled,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} is not set", key)))
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
