// Proxy cache: remembers which proxy last served a target.
//
// Persisted as one flat JSON object:
//   { "<normalized target url>": "<proxy url>", ... }
//
// The cache is advisory. Every hit is re-probed before use, so a stale or
// lost entry only costs a discovery round. Writes are read-modify-write of
// the whole file with no locking; concurrent writers race and the last one
// wins.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::default_cache_path;

pub type CacheEntries = BTreeMap<String, String>;

/// File-backed target → proxy mapping.
#[derive(Debug, Clone)]
pub struct ProxyCache {
    path: PathBuf,
}

impl ProxyCache {
    /// Cache stored at an explicit location.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at `<config-dir>/vpn-share-tool/libproxy_cache.json`.
    pub fn default_location() -> Option<Self> {
        default_cache_path().map(Self::at)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry. A missing, unreadable or malformed file is an
    /// empty cache.
    pub fn load(&self) -> CacheEntries {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheEntries::new(),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Failed to read cache");
                return CacheEntries::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Failed to parse cache");
                CacheEntries::new()
            }
        }
    }

    pub fn lookup(&self, target: &str) -> Option<String> {
        self.load().remove(target)
    }

    /// Merge one entry into the file, creating parent directories as needed.
    pub fn save(&self, target: &str, proxy: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory {}", parent.display())
            })?;
        }

        let mut entries = self.load();
        entries.insert(target.to_string(), proxy.to_string());

        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize cache")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache to {}", self.path.display()))?;
        Ok(())
    }
}
