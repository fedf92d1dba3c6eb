// Project-wide constants
//
// Centralised here so port numbers and other magic values have one
// source of truth. Import via `use crate::config::constants::*;`.

/// TCP port the discovery server listens on (TLS line protocol).
pub const DEFAULT_DISCOVERY_PORT: u16 = 45679;

/// Discovery servers tried after anything found by the subnet scan.
pub const DEFAULT_FALLBACK_HOSTS: &[&str] = &["192.168.0.81", "192.168.1.81"];

/// Timeout for the direct probe, registry exchange and instance API calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Timeout for re-validating a cached proxy before trusting it.
pub const DEFAULT_CACHE_PROBE_TIMEOUT_SECS: u64 = 2;

/// Per-host TCP connect timeout during the subnet scan.
pub const DEFAULT_SCAN_PROBE_TIMEOUT_MS: u64 = 200;

/// Number of scan probes allowed in flight at once.
pub const DEFAULT_SCAN_WORKERS: usize = 50;

/// Directory (under the platform config dir) shared with the rest of vpn-share-tool.
pub const APP_DIR_NAME: &str = "vpn-share-tool";

pub const CACHE_FILE_NAME: &str = "libproxy_cache.json";

pub const CONFIG_FILE_NAME: &str = "libproxy.toml";

/// Runtime override for the CA certificate location.
pub const CA_PATH_ENV: &str = "VPN_SHARE_TOOL_CA_PATH";

/// Marker left in place when no CA was injected at build time.
pub const CA_PLACEHOLDER: &str = "__CA_CERT_PLACEHOLDER__";
