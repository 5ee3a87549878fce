//! Spirit Scry gateway: serves the chat page and the profile/ask JSON endpoints.
//! Config-driven via ScryConfig; one Orchestrator shared by every request.

mod handlers;

use std::sync::Arc;

use scry_core::{Orchestrator, ProfileStore, ScryConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[scry-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ScryConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let store = ProfileStore::new(config.profile_path());
    let orchestrator = match Orchestrator::open(store, config.model_backend()) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => {
            tracing::error!(error = %e, "failed to load profile");
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(
        %addr,
        backend = orchestrator.backend_name(),
        profile = %orchestrator.store().path().display(),
        "Spirit Scry gateway listening"
    );

    let app = handlers::router(handlers::AppState { orchestrator });
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("CTRL-C received; shutting down gateway");
        }
    });

    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
