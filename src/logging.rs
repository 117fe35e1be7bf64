use tracing_subscriber::EnvFilter;

/// Initialize logging with `RUST_LOG` support.
///
/// Defaults to `sgmap=warn`, or `sgmap=debug` when `verbose` is set. Logs go
/// to stderr so rendered tables and JSON on stdout stay clean.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "sgmap=debug" } else { "sgmap=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // try_init so a second call (tests, all-regions loop) is a no-op
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
