//! Diagnostic tracing for the upgrade pipeline.
//!
//! Logs go to stderr so stdout carries only the final report (text or JSON).

use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset, so tolerated
/// failures (a safe path that could not be resolved) are still visible.
/// Colors are used only when stderr is a terminal and `NO_COLOR` is unset.
///
/// # Example
/// ```bash
/// RUST_LOG=upmerge=debug upmerge upstream v1 v2
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(use_color(
                    std::io::stderr().is_terminal(),
                    std::env::var_os("NO_COLOR").is_some(),
                ))
                .compact(),
        )
        .init();
}

fn use_color(stderr_is_terminal: bool, no_color: bool) -> bool {
    stderr_is_terminal && !no_color
}
