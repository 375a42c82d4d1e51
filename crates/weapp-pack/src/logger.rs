//! Logging setup.
//!
//! Library crates emit `tracing` events; this installs the subscriber that
//! prints them. Level selection, highest priority first:
//!
//! 1. `--verbose`: debug for the weapp crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATES: [&str; 6] = [
    "weapp_pack",
    "weapp_chunks",
    "weapp_graph",
    "weapp_config",
    "wxml_transform",
    "wxml_parser",
];

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls do nothing.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(!no_color)
            .with_writer(std::io::stderr)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(filter(verbose, quiet))
            .with(fmt_layer)
            .try_init();
    });
}

fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(directives("debug"))
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("info")))
    }
}

fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}
