// libproxy - find or create a shared proxy for a target address
// Main entry point
//
// Exit codes:
//   0    resolved (stdout: proxy address, or the target itself if reachable)
//   1    usage error or invalid configuration / trust anchor
//   2    no instances found
//   255  instances found, but none could reach or create a proxy

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use vpn_share_libproxy::config::{build_config, load_settings};
use vpn_share_libproxy::logging;
use vpn_share_libproxy::{DiscoveryService, ProxyCache, ResolveOptions, Resolver};

#[derive(Parser, Debug)]
#[command(name = "libproxy", version, about = "Find or create a shared proxy for a target address")]
struct Cli {
    /// Target address: host[:port] or a full URL
    target: String,

    /// Skip the direct reachability check and always look for a proxy
    #[arg(long)]
    remote_only: bool,

    /// Timeout in seconds for each network call
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Do not scan the local subnet for discovery servers
    #[arg(long)]
    no_scan: bool,

    /// Configuration file (default: <config-dir>/vpn-share-tool/libproxy.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init(cli.verbose);
    ExitCode::from(run(cli).await)
}

async fn run(cli: Cli) -> u8 {
    // Configuration and trust anchor are resolved before any socket is opened.
    let mut settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return 1;
        }
    };
    if let Some(secs) = cli.timeout {
        settings.timeout_secs = secs;
    }
    if cli.no_scan {
        settings.scan_disabled = true;
    }

    let config = match build_config(settings) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Refusing to run without a valid CA certificate");
            return 1;
        }
    };

    let source = match DiscoveryService::from_config(&config) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Failed to set up discovery");
            return 1;
        }
    };

    let options = ResolveOptions {
        remote_only: cli.remote_only,
        ..ResolveOptions::from_settings(&config.settings)
    };
    let mut resolver = match Resolver::new(source, options) {
        Ok(resolver) => resolver,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Failed to set up resolver");
            return 1;
        }
    };
    if let Some(path) = &config.cache_path {
        resolver = resolver.with_cache(ProxyCache::at(path));
    }

    match resolver.resolve(&cli.target).await {
        Ok(resolution) => {
            println!("{}", resolution.proxy_address());
            0
        }
        Err(e) => {
            tracing::debug!(error = %e, "Resolution failed");
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "libproxy",
            "--remote-only",
            "--timeout",
            "3",
            "--no-scan",
            "-vv",
            "intranet.corp",
        ])
        .unwrap();
        assert_eq!(cli.target, "intranet.corp");
        assert!(cli.remote_only);
        assert_eq!(cli.timeout, Some(3));
        assert!(cli.no_scan);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_requires_target() {
        assert!(Cli::try_parse_from(["libproxy"]).is_err());
    }
}
