//! Server startup helper for embedding in the radar binary.
//!
//! Provides [`spawn_observer`] which binds the listener eagerly and then
//! serves the radar on a background Tokio task, so a taken port is
//! reported before the binary moves on to ingestion.
//!
//! # Usage
//!
//! ```rust,ignore
//! use liveradar_observer::server::ServerConfig;
//! use liveradar_observer::startup::spawn_observer;
//!
//! let handle = spawn_observer(&ServerConfig::default(), state).await?;
//! println!("serving on {}", handle.addr);
//! handle.task.await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running server.
#[derive(Debug)]
pub struct ObserverHandle {
    /// The address actually bound.
    pub addr: SocketAddr,
    /// The serving task. It finishes only if serving fails.
    pub task: JoinHandle<()>,
}

/// Bind `config`'s address and serve the radar on a background task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot
/// be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ObserverHandle, StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Radar server exited with error");
        }
    });

    tracing::info!(%addr, "Radar server spawned on background task");

    Ok(ObserverHandle { addr, task })
}
