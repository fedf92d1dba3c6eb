// Configuration structs

use super::constants::*;
use super::trust::TrustAnchor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// On-disk settings. Every field has a default so an empty or missing file
/// is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Port the discovery servers listen on
    pub discovery_port: u16,

    /// Discovery servers tried after the scanned ones, in order
    pub fallback_hosts: Vec<String>,

    /// Timeout for direct probes, registry and instance calls (seconds)
    pub timeout_secs: u64,

    /// Timeout for re-validating a cached proxy (seconds)
    pub cache_probe_timeout_secs: u64,

    /// Per-host connect timeout during the subnet scan (milliseconds)
    pub scan_probe_timeout_ms: u64,

    /// Concurrent probes during the subnet scan
    pub scan_workers: usize,

    /// Skip the local subnet scan and use only the fallback hosts
    pub scan_disabled: bool,

    /// PEM file holding the discovery-server CA
    pub ca_path: Option<PathBuf>,

    /// Override for the proxy cache file location
    pub cache_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discovery_port: DEFAULT_DISCOVERY_PORT,
            fallback_hosts: DEFAULT_FALLBACK_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_probe_timeout_secs: DEFAULT_CACHE_PROBE_TIMEOUT_SECS,
            scan_probe_timeout_ms: DEFAULT_SCAN_PROBE_TIMEOUT_MS,
            scan_workers: DEFAULT_SCAN_WORKERS,
            scan_disabled: false,
            ca_path: None,
            cache_path: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_probe_timeout_secs)
    }

    pub fn scan_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_probe_timeout_ms)
    }
}

/// Fully resolved runtime configuration.
///
/// Built once at startup. Holding a `Config` means the trust anchor has
/// already been validated, so nothing downstream re-checks it.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub trust_anchor: TrustAnchor,
    /// Resolved cache file location (None if no config dir could be found)
    pub cache_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let s = Settings::default();
        assert_eq!(s.discovery_port, 45679);
        assert_eq!(s.fallback_hosts, vec!["192.168.0.81", "192.168.1.81"]);
        assert_eq!(s.timeout(), Duration::from_secs(10));
        assert_eq!(s.cache_probe_timeout(), Duration::from_secs(2));
        assert_eq!(s.scan_probe_timeout(), Duration::from_millis(200));
        assert_eq!(s.scan_workers, 50);
        assert!(!s.scan_disabled);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let s: Settings = toml::from_str("discovery_port = 5000\nscan_workers = 8\n").unwrap();
        assert_eq!(s.discovery_port, 5000);
        assert_eq!(s.scan_workers, 8);
        assert_eq!(s.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(s.fallback_hosts.len(), 2);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let s: Settings = toml::from_str("").unwrap();
        assert_eq!(s, Settings::default());
    }
}
