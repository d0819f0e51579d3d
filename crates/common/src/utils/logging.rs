use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";

/// Initialize tracing subscriber with sensible defaults and stdout writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info,tower_http=info,axum=info`
/// - Writes to stdout to improve visibility in environments that hide stderr
pub fn init_logging_default() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set
/// - Store events under `service::counter` are emitted at debug by default
pub fn init_logging_json() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{DEFAULT_FILTER},service::counter=debug")));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the subscriber by name (`json` or anything else for compact).
pub fn init_logging(format: &str) {
    if format.eq_ignore_ascii_case("json") {
        init_logging_json();
    } else {
        init_logging_default();
    }
}
