use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub image_api: ImageApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8069
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file; relative paths resolve against the config file's directory
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("plcimages.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// The external service that knows which images were captured per part.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageApiConfig {
    #[serde(default = "default_image_api_url")]
    pub base_url: String,

    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_image_api_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

impl ImageApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ImageApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Object storage holding the image files themselves.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Public base URL; image URLs are `<public_url>/<bucket>/<file>`
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_public_url() -> String {
    "http://localhost:9000".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Remove a product's stored images even when the fetch fails (default: true)
    #[serde(default = "default_clear_on_failure")]
    pub clear_on_failure: bool,
}

fn default_clear_on_failure() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            clear_on_failure: default_clear_on_failure(),
        }
    }
}
