// crates/server/src/main.rs
//! Animatic control-plane binary.
//!
//! Binds the loopback API immediately, attaches the headless runner in
//! place of the desktop window, and supervises renders until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use animatic_render::{RenderManager, RendererConfig};
use animatic_server::{create_app, spawn_event_logger, spawn_headless_runner, AppState};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Default port for the control-plane API.
const DEFAULT_PORT: u16 = 3333;

/// Get the API port from environment or use default.
fn get_port() -> u16 {
    std::env::var("ANIMATIC_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    eprintln!("\n\u{1f39e} animatic v{}\n", env!("CARGO_PKG_VERSION"));

    let renderer = RendererConfig::from_env();
    tracing::info!(renderer = %renderer.program.display(), "using renderer");

    let manager = Arc::new(RenderManager::new(renderer));
    let state = AppState::new(Arc::clone(&manager));

    // Headless mode: the runner stands in for the desktop window, so
    // injected code renders without any UI process attached.
    spawn_headless_runner(Arc::clone(&state));
    spawn_event_logger(Arc::clone(&state));

    let app = create_app(state);

    // Loopback only: the control plane trusts local callers and nobody
    // else.
    let port = get_port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    eprintln!("  \u{2192} control plane on http://127.0.0.1:{port}\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(manager))
        .await?;

    Ok(())
}

/// Wait for ctrl-c, then tear down every live render before the
/// listener stops accepting.
async fn shutdown_signal(manager: Arc<RenderManager>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown requested");
    manager.shutdown_all();
}
