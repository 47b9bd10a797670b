//! Logging initialization for the CLI.
//!
//! Logging is owned by the CLI crate to keep library crates lightweight.
//! Everything goes to stderr so stdout only carries reports.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber based on configuration.
///
/// # Arguments
/// * `verbosity` - 0 leaves `RUST_LOG` (default `warn`) in charge, 1 = DEBUG
///   and 2+ = TRACE for the `depsize` targets
/// * `json` - If true, output JSON lines to stderr
///
/// JSON output format:
/// ```json
/// {"timestamp":"...","level":"WARN","target":"depsize_core::pkg::backend","fields":{"backend":"uv","code":"BACKEND_TIMEOUT","message":"..."}}
/// ```
pub fn init(verbosity: u8, json: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, env.as_deref());
    let subscriber = tracing_subscriber::registry().with(filter);

    let result = if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(err) = result {
        eprintln!("warning: logging already initialized: {err}");
    }
}

/// `RUST_LOG` (or `warn`), with `-v` flags raising the `depsize` targets.
fn build_filter(verbosity: u8, env: Option<&str>) -> EnvFilter {
    let mut filter = env
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let level = match verbosity {
        0 => return filter,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    for target in ["depsize_core", "depsize"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}
