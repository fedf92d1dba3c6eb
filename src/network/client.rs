// Proxy-hosting instance API client.
//
// Each vpn-share-tool instance exposes a small HTTP API on `host:port`.
// Only the client side is implemented here.
//
//   GET /services
//     Response 200: [{ original_url, shared_url }, ...]   (may be `null`)
//
//   GET /can-reach?url=<urlencoded target>
//     Response 200: { reachable: bool }
//
//   POST /proxies
//     Body: { url }
//     Response 201: { shared_url, ... }

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A proxy mapping reported by an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub original_url: String,
    pub shared_url: String,
}

/// Response from GET /can-reach
#[derive(Debug, Deserialize)]
pub struct CanReachResponse {
    pub reachable: bool,
}

/// Payload for POST /proxies
#[derive(Debug, Serialize)]
pub struct CreateProxyRequest<'a> {
    pub url: &'a str,
}

/// Response from POST /proxies
#[derive(Debug, Deserialize)]
pub struct CreateProxyResponse {
    pub shared_url: String,
}

/// Client for the instance HTTP API. Ambient proxy settings are ignored:
/// instances live on the local network.
#[derive(Debug, Clone)]
pub struct InstanceClient {
    http: Client,
}

impl InstanceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http })
    }

    /// Existing proxies hosted by `instance`.
    pub async fn services(&self, instance: &str) -> Result<Vec<ServiceRecord>> {
        let url = format!("http://{}/services", instance);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if !resp.status().is_success() {
            bail!("{} returned status {}", url, resp.status());
        }

        let services: Option<Vec<ServiceRecord>> = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse service list from {}", url))?;
        Ok(services.unwrap_or_default())
    }

    /// Whether `instance` reports it can reach `target`.
    pub async fn can_reach(&self, instance: &str, target: &str) -> Result<bool> {
        let url = format!("http://{}/can-reach", instance);
        let resp = self
            .http
            .get(&url)
            .query(&[("url", target)])
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if resp.status() != StatusCode::OK {
            bail!("{} returned status {}", url, resp.status());
        }

        let body: CanReachResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse reachability from {}", url))?;
        Ok(body.reachable)
    }

    /// Ask `instance` to create a shared proxy for `target`. Only
    /// `201 Created` counts as success.
    pub async fn create_proxy(&self, instance: &str, target: &str) -> Result<String> {
        let url = format!("http://{}/proxies", instance);
        let resp = self
            .http
            .post(&url)
            .json(&CreateProxyRequest { url: target })
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if resp.status() != StatusCode::CREATED {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("{} failed to create proxy, status {}: {}", instance, status, body.trim());
        }

        let created: CreateProxyResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse creation response from {}", url))?;
        Ok(created.shared_url)
    }
}
