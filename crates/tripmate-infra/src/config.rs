//! Client configuration loader for Tripmate.
//!
//! Reads `config.toml` from the data directory (`~/.tripmate/` by default)
//! and deserializes it into [`ClientConfig`]. A missing file means
//! defaults; environment variables then override the endpoints.

use std::path::{Path, PathBuf};

use url::Url;

use tripmate_types::config::ClientConfig;
use tripmate_types::error::ConfigError;

pub const DATA_DIR_ENV: &str = "TRIPMATE_DATA_DIR";
pub const API_URL_ENV: &str = "TRIPMATE_API_URL";
pub const WS_URL_ENV: &str = "TRIPMATE_WS_URL";

/// Resolve the data directory: `$TRIPMATE_DATA_DIR`, else `~/.tripmate`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => return PathBuf::from(dir),
        _ => {}
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tripmate")
}

/// Load `{data_dir}/config.toml`, apply environment overrides and
/// validate the endpoint URLs.
///
/// - Missing file: defaults.
/// - Unreadable or malformed file: an error naming the file.
pub async fn load_client_config(data_dir: &Path) -> Result<ClientConfig, ConfigError> {
    let config_path = data_dir.join("config.toml");

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => {
            toml::from_str::<ClientConfig>(&content).map_err(|e| ConfigError::Parse {
                path: config_path.display().to_string(),
                message: e.to_string(),
            })?
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            ClientConfig::default()
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: config_path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Override endpoints from the environment. `lookup` is `std::env::var` in
/// production.
pub fn apply_env_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.api.base_url = url;
    }
    if let Some(url) = lookup(WS_URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.realtime.url = url;
    }
}

/// Check that every configured endpoint is an absolute URL with the right
/// scheme.
pub fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
    check_url(&config.api.base_url, &["http", "https"])?;
    check_url(&config.api.web_origin, &["http", "https"])?;
    check_url(&config.realtime.url, &["ws", "wss"])?;
    Ok(())
}

fn check_url(raw: &str, schemes: &[&str]) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}
