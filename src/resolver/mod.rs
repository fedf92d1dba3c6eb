// Proxy resolution
//
// resolve(target) walks a fixed pipeline and stops at the first stage that
// produces an address:
//
//   direct probe -> cache (re-probed) -> discover instances
//     -> Phase 1 (existing proxy) -> Phase 2 (create proxy)
//
// Every step carries its own timeout and failures only advance the
// pipeline. The result is all-or-nothing: an address or a classified error.

pub mod ordered;
pub mod phases;
pub mod target;

use async_trait::async_trait;
use std::time::Duration;

use crate::cache::ProxyCache;
use crate::config::constants::{DEFAULT_CACHE_PROBE_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use crate::config::Settings;
use crate::errors::ResolveError;
use crate::network::{is_reachable, InstanceClient};

pub use ordered::first_success;
pub use phases::{create_on_demand, find_existing, Found};
pub use target::Target;

/// Supplies the proxy-hosting instances (`host:port`) to try, in order.
#[async_trait]
pub trait InstanceSource: Send + Sync {
    async fn instances(&self) -> Vec<String>;
}

#[async_trait]
impl InstanceSource for Vec<String> {
    async fn instances(&self) -> Vec<String> {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Timeout for the direct probe and every instance API call
    pub timeout: Duration,
    /// Timeout for re-validating a cached proxy
    pub cache_probe_timeout: Duration,
    /// Skip the direct probe and always look for a proxy
    pub remote_only: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_probe_timeout: Duration::from_secs(DEFAULT_CACHE_PROBE_TIMEOUT_SECS),
            remote_only: false,
        }
    }
}

impl ResolveOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: settings.timeout(),
            cache_probe_timeout: settings.cache_probe_timeout(),
            remote_only: false,
        }
    }
}

/// Successful outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Target answered directly; carries the target exactly as given.
    Direct(String),
    /// A cached proxy that still answers.
    Cached(String),
    /// A proxy an instance was already hosting.
    Existing(Found),
    /// A proxy created on request.
    Created(Found),
}

impl Resolution {
    /// The address the caller should use.
    pub fn proxy_address(&self) -> &str {
        match self {
            Resolution::Direct(addr) | Resolution::Cached(addr) => addr,
            Resolution::Existing(found) | Resolution::Created(found) => &found.shared_url,
        }
    }
}

pub struct Resolver<S> {
    source: S,
    client: InstanceClient,
    cache: Option<ProxyCache>,
    options: ResolveOptions,
}

impl<S: InstanceSource> Resolver<S> {
    pub fn new(source: S, options: ResolveOptions) -> anyhow::Result<Self> {
        Ok(Self {
            source,
            client: InstanceClient::new(options.timeout)?,
            cache: None,
            options,
        })
    }

    pub fn with_cache(mut self, cache: ProxyCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn resolve(&self, input: &str) -> Result<Resolution, ResolveError> {
        let target = Target::parse(input)?;

        if !self.options.remote_only {
            tracing::debug!(url = %target, "Checking direct reachability");
            if is_reachable(target.normalized(), self.options.timeout).await {
                tracing::info!(url = %target.original(), "Directly reachable, no proxy needed");
                return Ok(Resolution::Direct(target.original().to_string()));
            }
        }

        if let Some(proxy) = self.cached_proxy(&target).await {
            tracing::info!(proxy = %proxy, "Using cached proxy");
            return Ok(Resolution::Cached(proxy));
        }

        tracing::debug!(url = %target, "No usable cache entry, starting discovery");
        let instances = self.source.instances().await;
        if instances.is_empty() {
            tracing::info!("No active vpn-share-tool instances found");
            return Err(ResolveError::NoInstances);
        }

        tracing::debug!(count = instances.len(), "Phase 1: checking for existing proxies");
        if let Some(found) = find_existing(&self.client, &instances, &target).await {
            tracing::info!(instance = %found.instance, proxy = %found.shared_url, "Found existing proxy");
            self.remember(&target, &found.shared_url);
            return Ok(Resolution::Existing(found));
        }

        tracing::debug!("Phase 2: no existing proxy, requesting creation");
        if let Some(found) = create_on_demand(&self.client, &instances, &target).await {
            self.remember(&target, &found.shared_url);
            return Ok(Resolution::Created(found));
        }

        tracing::error!(
            url = %target.original(),
            instances = instances.len(),
            "Found instance(s), but none could reach or create a proxy"
        );
        Err(ResolveError::Exhausted {
            instances: instances.len(),
        })
    }

    /// Cached proxy for the target, if it still answers.
    async fn cached_proxy(&self, target: &Target) -> Option<String> {
        let proxy = self.cache.as_ref()?.lookup(target.normalized())?;
        tracing::debug!(proxy = %proxy, "Found cached proxy");
        if is_reachable(&proxy, self.options.cache_probe_timeout).await {
            Some(proxy)
        } else {
            tracing::debug!(proxy = %proxy, "Cached proxy not reachable, discarding");
            None
        }
    }

    fn remember(&self, target: &Target, proxy: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(target.normalized(), proxy) {
                tracing::warn!(error = %format!("{:#}", e), "Failed to update proxy cache");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_address_per_variant() {
        let found = Found {
            instance: "192.168.1.5:8000".to_string(),
            shared_url: "http://192.168.1.5:9001".to_string(),
        };
        assert_eq!(Resolution::Direct("a.b".into()).proxy_address(), "a.b");
        assert_eq!(Resolution::Cached("http://c".into()).proxy_address(), "http://c");
        assert_eq!(
            Resolution::Existing(found.clone()).proxy_address(),
            "http://192.168.1.5:9001"
        );
        assert_eq!(
            Resolution::Created(found).proxy_address(),
            "http://192.168.1.5:9001"
        );
    }

    #[tokio::test]
    async fn test_invalid_target_fails_before_any_network() {
        let resolver = Resolver::new(Vec::<String>::new(), ResolveOptions::default()).unwrap();
        assert!(matches!(
            resolver.resolve("").await,
            Err(ResolveError::InvalidTarget(_))
        ));
    }
}
