//! Logging setup
//!
//! `PICO_LOG` takes an `EnvFilter` directive and wins over `-v`. Logs go to
//! stderr so `--stdout` output stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "PICO_LOG";

/// Filter for a repeated `-v` count.
pub fn filter_for(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| filter_for(verbose));

    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .try_init();
}
