//! Tracing setup for the `cadence` binary.
//!
//! Commands print their results on stdout, which scripts and the CLI tests
//! parse. Diagnostics therefore go to stderr only, filtered by `RUST_LOG`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the stderr subscriber at `info`, unless `RUST_LOG` says otherwise
///
/// At `info` each command reports the files it touched (config, rollup,
/// reviews saved). `RUST_LOG=cadence_core=debug` adds per-card lock and
/// load/save detail.
pub fn init() {
    init_with_level("info")
}

/// Install the stderr subscriber with `default_level` as the fallback filter
///
/// Must be called at most once per process; `RUST_LOG` still wins when set.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route logs into the test harness's captured output
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
