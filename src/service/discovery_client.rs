// Instance registry client
//
// Asks discovery servers which proxy-hosting instances are alive. The wire
// protocol is one request line and one response line over TLS:
//
//   -> LIST\n
//   <- [{"address": "192.168.1.5:8000", ...}, ...]\n
//
// Candidates are tried strictly in order; the first well-formed, non-empty
// list wins.

use anyhow::{bail, Context, Result};
use rustls::pki_types::ServerName;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use super::tls::discovery_connector;
use crate::config::TrustAnchor;
use crate::resolver::first_success;

pub const LIST_COMMAND: &[u8] = b"LIST\n";

/// Upper bound on the response line; anything longer is rejected.
pub const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

/// One registry entry. Servers may send more fields; only the address is used.
#[derive(Debug, Deserialize)]
struct InstanceRecord {
    address: String,
}

/// Client for the discovery servers' instance registry.
#[derive(Clone)]
pub struct RegistryClient {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
}

impl RegistryClient {
    pub fn new(anchor: &TrustAnchor, port: u16, timeout: Duration) -> Result<Self> {
        let connector =
            discovery_connector(anchor).context("Failed to build discovery TLS configuration")?;
        Ok(Self {
            connector,
            port,
            timeout,
        })
    }

    /// Instance addresses from the first candidate that returns any.
    /// Empty if every candidate fails.
    pub async fn list_instances(&self, candidates: &[String]) -> Vec<String> {
        let found = first_success("discovery server", candidates, |host| async move {
            let instances = self.query(host).await?;
            Ok((!instances.is_empty()).then_some(instances))
        })
        .await;

        match found {
            Some(instances) => {
                tracing::info!(count = instances.len(), "Retrieved instance list");
                instances
            }
            None => {
                tracing::error!("Failed to get instances from any discovery server");
                Vec::new()
            }
        }
    }

    /// Full exchange with one discovery server.
    pub async fn query(&self, host: &str) -> Result<Vec<String>> {
        tracing::debug!(host, port = self.port, "Trying discovery server");

        let tcp = tokio::time::timeout(self.timeout, TcpStream::connect((host, self.port)))
            .await
            .with_context(|| format!("Timed out connecting to {}:{}", host, self.port))?
            .with_context(|| format!("Failed to connect to {}:{}", host, self.port))?;

        let server_name = ServerName::try_from(host.to_string())
            .with_context(|| format!("Invalid server name {}", host))?;

        let exchange = async {
            let tls = self
                .connector
                .connect(server_name, tcp)
                .await
                .context("TLS handshake failed")?;
            request_list(tls).await
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .with_context(|| format!("Timed out talking to {}", host))?
    }
}

/// Send `LIST` and parse the single response line.
pub async fn request_list<S>(mut stream: S) -> Result<Vec<String>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(LIST_COMMAND)
        .await
        .context("Failed to send LIST")?;
    stream.flush().await.context("Failed to send LIST")?;

    let mut reader = BufReader::new(stream.take(MAX_RESPONSE_BYTES));
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .await
        .context("Failed to read LIST response")?;
    if read == 0 || line.trim().is_empty() {
        bail!("Discovery server closed the connection without a response");
    }
    if read as u64 >= MAX_RESPONSE_BYTES && !line.ends_with('\n') {
        bail!("LIST response exceeds {} bytes", MAX_RESPONSE_BYTES);
    }

    parse_instance_list(&line)
}

/// Addresses from a JSON array of instance records.
pub fn parse_instance_list(line: &str) -> Result<Vec<String>> {
    let records: Vec<InstanceRecord> =
        serde_json::from_str(line.trim()).context("Malformed instance list")?;
    Ok(records.into_iter().map(|r| r.address).collect())
}
