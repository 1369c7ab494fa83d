//! Startup helpers for the Super AI chat binaries.

use std::process::ExitCode;
use std::sync::Arc;

use crate::chat::ChatResult;
use crate::server::{self, AppState};

/// Environment variable holding the HTTP port.
pub const ENV_PORT: &str = "SUPERAI_PORT";

/// Install the global `tracing` subscriber (`RUST_LOG`, default `info`).
///
/// Call once per process, before any other startup step.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Run the HTTP server (used by the `superai-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting Super AI chat v{}", env!("CARGO_PKG_VERSION"));

    let state = match initialize() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, port, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Initialize application state without starting the server.
///
/// # Errors
/// Returns an error if the configuration in the environment is invalid.
pub fn initialize() -> ChatResult<Arc<AppState>> {
    let state = AppState::new()?;
    tracing::info!(
        reply_delay_ms = state.chat.config().reply_delay_ms,
        reply_targeting = ?state.chat.config().reply_targeting,
        "Chat engine configured"
    );
    Ok(state)
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var(ENV_PORT)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}
