mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.database.path.is_relative() {
        if let Some(dir) = path.parent() {
            config.database.path = dir.join(&config.database.path);
        }
    }

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)?;
    normalize_config(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./plcimages.toml",
        "~/.config/plcimages/config.toml",
        "/etc/plcimages/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn normalize_config(config: &mut Config) {
    let trimmed = config.image_api.base_url.trim_end_matches('/').to_string();
    config.image_api.base_url = trimmed;

    let trimmed = config.storage.public_url.trim_end_matches('/').to_string();
    config.storage.public_url = trimmed;
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    validate_http_url("image_api.base_url", &config.image_api.base_url)?;
    validate_http_url("storage.public_url", &config.storage.public_url)?;

    if config.image_api.timeout_secs == 0 {
        anyhow::bail!("image_api.timeout_secs cannot be 0");
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = reqwest::Url::parse(value)
        .with_context(|| format!("{} is not a valid URL: {}", field, value))?;

    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https: {}", field, value);
    }

    Ok(())
}
