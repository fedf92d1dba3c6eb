// Trust anchor for the discovery-server TLS channel
//
// Resolved once at startup. A missing or placeholder CA is a hard error:
// discovery never falls back to an unauthenticated connection.

use super::constants::{CA_PATH_ENV, CA_PLACEHOLDER};
use crate::errors::ConfigError;
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// PEM injected at build time (`VPN_SHARE_TOOL_CA_PEM=... cargo build`).
pub const EMBEDDED_CA_PEM: Option<&str> = option_env!("VPN_SHARE_TOOL_CA_PEM");

/// Where the trust anchor came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorSource {
    Environment(PathBuf),
    ConfigFile(PathBuf),
    Embedded,
}

impl fmt::Display for AnchorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorSource::Environment(p) => write!(f, "${} ({})", CA_PATH_ENV, p.display()),
            AnchorSource::ConfigFile(p) => write!(f, "ca_path ({})", p.display()),
            AnchorSource::Embedded => write!(f, "embedded"),
        }
    }
}

/// Validated CA certificate(s) used to authenticate discovery servers.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    roots: Arc<RootCertStore>,
    source: AnchorSource,
}

impl TrustAnchor {
    /// Parse and validate PEM material.
    pub fn from_pem(pem: &str, source: AnchorSource) -> Result<Self, ConfigError> {
        if pem.trim().is_empty() {
            return Err(ConfigError::MissingTrustAnchor);
        }
        if pem.contains(CA_PLACEHOLDER) {
            return Err(ConfigError::PlaceholderTrustAnchor);
        }

        let mut reader = pem.as_bytes();
        let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
            .collect::<Result<_, _>>()
            .map_err(|e| ConfigError::InvalidTrustAnchor(e.to_string()))?;
        if certs.is_empty() {
            return Err(ConfigError::InvalidTrustAnchor(
                "no certificate found in PEM data".to_string(),
            ));
        }

        let mut roots = RootCertStore::empty();
        for cert in certs {
            roots
                .add(cert)
                .map_err(|e| ConfigError::InvalidTrustAnchor(e.to_string()))?;
        }

        Ok(Self {
            roots: Arc::new(roots),
            source,
        })
    }

    /// Read a PEM file and validate it.
    pub fn from_file(path: &Path, source: AnchorSource) -> Result<Self, ConfigError> {
        let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadTrustAnchor {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(&pem, source)
    }

    /// Pick the anchor by precedence: environment path, configured path,
    /// then the build-time embedded PEM.
    ///
    /// A path that is named but unreadable is an error; it never falls
    /// through to a lower-precedence source.
    pub fn resolve(
        env_path: Option<PathBuf>,
        config_path: Option<&Path>,
        embedded: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
            return Self::from_file(&path, AnchorSource::Environment(path.clone()));
        }
        if let Some(path) = config_path {
            return Self::from_file(path, AnchorSource::ConfigFile(path.to_path_buf()));
        }
        match embedded {
            Some(pem) => Self::from_pem(pem, AnchorSource::Embedded),
            None => Err(ConfigError::MissingTrustAnchor),
        }
    }

    pub fn roots(&self) -> Arc<RootCertStore> {
        Arc::clone(&self.roots)
    }

    pub fn source(&self) -> &AnchorSource {
        &self.source
    }

    /// Number of CA certificates loaded.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
