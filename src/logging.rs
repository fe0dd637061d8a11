// src/logging.rs
// =============================================================================
// Logging setup using tracing.
//
// Logs go to stderr so that stdout stays free for the rendered graph
// (`--output -`) or the JSON event stream (`--events`).
//
// Filtering:
// - RUST_LOG wins when it is set (e.g. RUST_LOG=mutual_graph=trace)
// - otherwise `warn`, or `mutual_graph=debug` when --verbose is passed
// =============================================================================

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Returns an error if a subscriber has already been installed.
pub fn init(verbose: bool) -> Result<()> {
    let default_directive = if verbose { "mutual_graph=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(verbose),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        // The first call may lose the race against other tests; either way the
        // second call must report an error instead of panicking
        let _ = init(false);
        assert!(init(true).is_err());
    }
}
