// Local subnet scan for discovery servers
//
// Probes every host of the /24 containing the local address with a short
// TCP connect. Probes run on a task set gated by a semaphore; results come
// back in completion order, not address order.
//
// 10.0.0.0/8 networks are never scanned.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::constants::{DEFAULT_SCAN_PROBE_TIMEOUT_MS, DEFAULT_SCAN_WORKERS};

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Connect timeout per host
    pub probe_timeout: Duration,
    /// Maximum probes in flight
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(DEFAULT_SCAN_PROBE_TIMEOUT_MS),
            workers: DEFAULT_SCAN_WORKERS,
        }
    }
}

/// Network address of the /24 containing `ip`.
pub fn subnet_of(ip: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = ip.octets();
    Ipv4Addr::new(a, b, c, 0)
}

/// Whether a network is excluded from scanning (anything in 10.x.x.x).
pub fn is_excluded(network: Ipv4Addr) -> bool {
    network.octets()[0] == 10
}

/// Usable host addresses of the /24 containing `ip` (.1 through .254).
pub fn subnet_hosts(ip: Ipv4Addr) -> impl Iterator<Item = Ipv4Addr> {
    let [a, b, c, _] = ip.octets();
    (1..=254).map(move |d| Ipv4Addr::new(a, b, c, d))
}

/// Hosts in the local /24 accepting TCP connections on `port`.
pub async fn scan_subnet(local_ip: Ipv4Addr, port: u16, options: ScanOptions) -> Vec<Ipv4Addr> {
    let network = subnet_of(local_ip);
    if is_excluded(network) {
        tracing::debug!(%network, "Skipping scan of 10.x.x.x network");
        return Vec::new();
    }

    tracing::debug!(%network, port, workers = options.workers, "Scanning subnet");

    let permits = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut probes = JoinSet::new();

    for host in subnet_hosts(local_ip) {
        let permits = Arc::clone(&permits);
        probes.spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            probe(host, port, options.probe_timeout).await.then_some(host)
        });
    }

    let mut found = Vec::new();
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok(Some(host)) => found.push(host),
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "Scan probe task failed"),
        }
    }

    tracing::debug!(%network, found = found.len(), "Subnet scan finished");
    found
}

async fn probe(host: Ipv4Addr, port: u16, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}
