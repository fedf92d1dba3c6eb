// Configuration loader
// Loads settings from <config-dir>/vpn-share-tool/libproxy.toml and resolves
// the trust anchor.

use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{APP_DIR_NAME, CACHE_FILE_NAME, CA_PATH_ENV, CONFIG_FILE_NAME};
use super::settings::{Config, Settings};
use super::trust::{TrustAnchor, EMBEDDED_CA_PEM};
use crate::errors::ConfigError;

/// `<platform config dir>/vpn-share-tool`
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

pub fn default_config_path() -> Option<PathBuf> {
    app_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

pub fn default_cache_path() -> Option<PathBuf> {
    app_config_dir().map(|dir| dir.join(CACHE_FILE_NAME))
}

/// Load settings.
///
/// With an explicit path the file must exist and parse. Without one, the
/// default location is optional and its absence means defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("No config file found, using defaults");
                return Ok(Settings::default());
            }
        },
    };

    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::ReadConfig {
        path: path.clone(),
        source,
    })?;
    let settings: Settings =
        toml::from_str(&contents).map_err(|source| ConfigError::ParseConfig {
            path: path.clone(),
            source,
        })?;

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(settings)
}

/// Turn settings into a runtime `Config`, resolving the trust anchor from
/// the environment, the settings, or the embedded PEM.
pub fn build_config(settings: Settings) -> Result<Config, ConfigError> {
    let env_path = std::env::var_os(CA_PATH_ENV).map(PathBuf::from);
    let trust_anchor =
        TrustAnchor::resolve(env_path, settings.ca_path.as_deref(), EMBEDDED_CA_PEM)?;
    tracing::debug!(
        source = %trust_anchor.source(),
        certificates = trust_anchor.len(),
        "Loaded discovery CA"
    );

    let cache_path = settings.cache_path.clone().or_else(default_cache_path);

    Ok(Config {
        settings,
        trust_anchor,
        cache_path,
    })
}

/// Load settings and resolve everything in one go.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    build_config(load_settings(explicit)?)
}
