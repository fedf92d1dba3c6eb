// Configuration module
// Public interface for configuration loading

pub mod constants;
mod loader;
mod settings;
mod trust;

pub use loader::{
    app_config_dir, build_config, default_cache_path, default_config_path, load_config,
    load_settings,
};
pub use settings::{Config, Settings};
pub use trust::{AnchorSource, TrustAnchor, EMBEDDED_CA_PEM};
