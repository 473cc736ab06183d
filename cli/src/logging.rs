use tracing_subscriber::EnvFilter;

/// Human-readable logs on stderr so they never interleave with answers on stdout.
/// `RUST_LOG` wins over the default level.
pub fn init(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
