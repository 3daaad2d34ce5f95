use tracing_subscriber::EnvFilter;

/// Log level used when `RUST_LOG` is not set. Warnings cover discarded iterations and
/// dropped samples.
const DEFAULT_DIRECTIVE: &str = "warn";

/// Sends log events to stderr, filtered by `RUST_LOG`, keeping stdout for reports.
///
/// Does nothing if a global subscriber has already been installed.
#[cfg_attr(test, mutants::skip)] // Global side effect, observed only through log output.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
