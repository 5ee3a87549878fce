//! Spirit Scry console: the interactive terminal variant.
//!
//! Logs go to stderr at `warn` unless RUST_LOG says otherwise, so the menu stays readable.

mod console;

use scry_core::{Orchestrator, ProfileStore, ScryConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console::Console;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[scry-console] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match ScryConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let orchestrator = match Orchestrator::open(ProfileStore::new(config.profile_path()), config.model_backend()) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!(error = %e, "failed to load profile");
            std::process::exit(1);
        }
    };
    tracing::info!(backend = orchestrator.backend_name(), "Spirit Scry console started");

    let stdin = std::io::stdin();
    let mut console = Console::new(&orchestrator, stdin.lock(), std::io::stdout());
    if let Err(e) = console.run().await {
        tracing::error!(error = %e, "terminal I/O failed");
        std::process::exit(1);
    }
}
