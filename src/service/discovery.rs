// Discovery server location
//
// Builds the ordered candidate list (scanned hosts first, then static
// fallbacks) and feeds it to the registry client. Together they are the
// instance source used by the resolver.

use async_trait::async_trait;
use std::net::Ipv4Addr;

use super::discovery_client::RegistryClient;
use crate::config::Config;
use crate::network::{detect_local_ip, scan_subnet, ScanOptions};
use crate::resolver::InstanceSource;

/// Locates candidate discovery servers.
#[derive(Debug, Clone)]
pub struct DiscoveryLocator {
    pub port: u16,
    pub fallback_hosts: Vec<String>,
    pub scan: Option<ScanOptions>,
}

impl DiscoveryLocator {
    pub fn from_config(config: &Config) -> Self {
        let settings = &config.settings;
        let scan = (!settings.scan_disabled).then(|| ScanOptions {
            probe_timeout: settings.scan_probe_timeout(),
            workers: settings.scan_workers,
        });
        Self {
            port: settings.discovery_port,
            fallback_hosts: settings.fallback_hosts.clone(),
            scan,
        }
    }

    /// Ordered, deduplicated hosts to try as discovery servers.
    pub async fn candidates(&self) -> Vec<String> {
        let scanned = match self.scan {
            Some(options) => self.scan_local(options).await,
            None => Vec::new(),
        };
        assemble_candidates(&scanned, &self.fallback_hosts)
    }

    async fn scan_local(&self, options: ScanOptions) -> Vec<Ipv4Addr> {
        let Some(local_ip) = detect_local_ip().await else {
            tracing::warn!("Could not detect local IP for scanning");
            return Vec::new();
        };

        tracing::debug!(%local_ip, "Detected local IP, scanning subnet");
        let found = scan_subnet(local_ip, self.port, options).await;
        if found.is_empty() {
            tracing::debug!("No discovery servers found via scanning");
        } else {
            tracing::info!(hosts = ?found, "Found discovery servers via scanning");
        }
        found
    }
}

/// Scanned hosts followed by fallbacks, first occurrence kept.
pub fn assemble_candidates(scanned: &[Ipv4Addr], fallbacks: &[String]) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(scanned.len() + fallbacks.len());
    let all = scanned
        .iter()
        .map(|ip| ip.to_string())
        .chain(fallbacks.iter().cloned());
    for host in all {
        if !candidates.contains(&host) {
            candidates.push(host);
        }
    }
    candidates
}

/// Locator plus registry client: the production instance source.
#[derive(Clone)]
pub struct DiscoveryService {
    locator: DiscoveryLocator,
    registry: RegistryClient,
}

impl DiscoveryService {
    pub fn new(locator: DiscoveryLocator, registry: RegistryClient) -> Self {
        Self { locator, registry }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = RegistryClient::new(
            &config.trust_anchor,
            config.settings.discovery_port,
            config.settings.timeout(),
        )?;
        Ok(Self::new(DiscoveryLocator::from_config(config), registry))
    }
}

#[async_trait]
impl InstanceSource for DiscoveryService {
    async fn instances(&self) -> Vec<String> {
        let candidates = self.locator.candidates().await;
        tracing::debug!(candidates = ?candidates, "Discovery candidates");
        self.registry.list_instances(&candidates).await
    }
}
