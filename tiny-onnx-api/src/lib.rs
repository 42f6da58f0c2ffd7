pub mod middleware;
pub mod service;

use anyhow::Context;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over `default_level`.
pub fn setup_logging(json: bool, default_level: LevelFilter) -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    if json {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_env_filter(env_filter)
            .finish();
        tracing::subscriber::set_global_default(subscriber).context("Setting up logging failed")
    } else {
        let subscriber = tracing_subscriber::fmt()
            .pretty()
            .compact()
            .with_level(true)
            .with_file(false)
            .with_line_number(false)
            .with_target(false)
            .without_time()
            .with_env_filter(env_filter)
            .finish();
        tracing::subscriber::set_global_default(subscriber).context("Setting up logging failed")
    }
}
