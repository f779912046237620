//! CLI subcommand implementations for the phishlens binary.

pub mod check_cmd;
pub mod doctor;
pub mod features_cmd;
pub mod output;
pub mod serve_cmd;
pub mod train_cmd;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides
/// `default_directive`. Logs always go to stderr.
pub fn init_logging(default_directive: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
