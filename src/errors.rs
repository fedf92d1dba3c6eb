// Caller-facing error types
//
// Per-candidate failures never reach this level: they are logged and
// absorbed where they happen. What is left is either a configuration
// problem (fail closed before touching the network) or a classified
// resolution failure.

use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration failures. All of them stop the process before any
/// socket is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no CA certificate configured; set VPN_SHARE_TOOL_CA_PATH or ca_path")]
    MissingTrustAnchor,

    #[error("CA certificate is still the build placeholder")]
    PlaceholderTrustAnchor,

    #[error("invalid CA certificate: {0}")]
    InvalidTrustAnchor(String),

    #[error("failed to read CA certificate from {path}")]
    ReadTrustAnchor {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read configuration from {path}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Why a resolution produced no proxy address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid target address: {0}")]
    InvalidTarget(String),

    /// No discovery server answered, or none knew of any instance.
    #[error("no active vpn-share-tool instances found")]
    NoInstances,

    /// Instances were found but none had or could create a proxy.
    #[error("found {instances} instance(s), but none could reach or create a proxy")]
    Exhausted { instances: usize },
}

impl ResolveError {
    /// Process exit code for the CLI. The soft and fatal not-found cases must
    /// stay distinguishable.
    pub fn exit_code(&self) -> u8 {
        match self {
            ResolveError::InvalidTarget(_) => 1,
            ResolveError::NoInstances => 2,
            ResolveError::Exhausted { .. } => 255,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        assert_eq!(ResolveError::InvalidTarget("x".into()).exit_code(), 1);
        assert_eq!(ResolveError::NoInstances.exit_code(), 2);
        assert_eq!(ResolveError::Exhausted { instances: 3 }.exit_code(), 255);
    }

    #[test]
    fn test_exhausted_message_mentions_count() {
        let e = ResolveError::Exhausted { instances: 2 };
        assert!(e.to_string().contains("2 instance(s)"));
    }
}
