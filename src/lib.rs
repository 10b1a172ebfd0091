pub mod cli;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod vision;

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise [`config::default_log_filter`]. Logs go to
/// stderr so stdout stays clean JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
