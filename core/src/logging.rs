// Tracing setup for hosts embedding the channel layer

/// Install a global `fmt` subscriber
///
/// `RUST_LOG` takes precedence over `default_filter`. Safe to call more than
/// once; only the first call installs a subscriber.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .try_init();
}
