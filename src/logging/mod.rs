// Diagnostic logging
//
// Everything goes to stderr; stdout carries only the resolved address.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count: 0 = info, 1 = debug, 2+ = trace.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    // Ignore the error if a subscriber is already set (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), "info");
        assert_eq!(level_for(1), "debug");
        assert_eq!(level_for(2), "trace");
        assert_eq!(level_for(9), "trace");
    }
}
