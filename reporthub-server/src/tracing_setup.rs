use tracing_subscriber::EnvFilter;

/// Initialize tracing from configuration. `RUST_LOG` wins over the configured
/// level so operators can raise verbosity without touching the config file.
pub fn install_tracing(cfg: &reporthub_config::LoggingConfig) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cfg.level.clone());

    if cfg.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::new(&filter))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(&filter))
            .init();
    }
}
