//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "BITPACK_LOG";

const DEFAULT_FILTER: &str = "bitpack_bench=info,bitpack_bench_core=info";

static INIT: Once = Once::new();

/// Initialize logging to stderr.
///
/// Reads `BITPACK_LOG` for per-module levels, e.g.
/// `BITPACK_LOG=bitpack_bench_core=debug`. Falls back to info for both crates
/// when unset or invalid. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
