//! ember-server - chat backend for the ember dating app
//!
//! REST API wrapping persona chat sessions around an external
//! text-completion service.

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod routes;
mod services;
mod state;

use services::CleanupService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("ember_server=info".parse()?)
                .add_directive("ember_core=info".parse()?),
        )
        .init();

    info!("ember-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::Config::load()?;
    info!(
        port = config.port,
        has_api_key = config.has_completion_keys(),
        "config loaded"
    );

    let state = state::AppState::new(config.clone())?;

    // Periodic session expiry sweeps
    let cleanup = CleanupService::start(
        state.sessions.clone(),
        config.sweep_interval(),
        config.session_max_age(),
    );

    let router = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("listening on http://0.0.0.0:{}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("shutting down...");
    cleanup.stop();

    Ok(())
}
