//! Shared tracing/logging initialization.
//!
//! Every adapter binary sets up `tracing_subscriber` the same way: an
//! env-filter plus optional JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for an adapter binary named `target`.
///
/// `debug` raises the level for the binary and the `evbridge` crates.
pub fn default_filter(target: &str, debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    let target = target.replace('-', "_");
    format!("{target}={level},evbridge_core={level},evbridge_file={level},evbridge_http={level}")
}

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- default `RUST_LOG` value when the env-var is not set.
/// * `log_json` -- when `true`, emit structured JSON log lines instead of the
///   human-readable format.
///
/// Logs go to stderr so a stdout sink stays a clean event stream.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    if log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_uses_crate_style_target() {
        let filter = default_filter("evbridge-file", false);
        assert!(filter.starts_with("evbridge_file=info"));
        assert!(filter.contains("evbridge_core=info"));
    }

    #[test]
    fn debug_raises_level() {
        assert!(default_filter("evbridge-http", true).contains("evbridge_core=debug"));
    }
}
