//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT / SIGTERM → graceful shutdown
//! - SIGHUP → configuration reload, not shutdown
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP goes through the same coordinator entry point as the file watcher

use std::sync::Arc;

use crate::lifecycle::Shutdown;
use crate::reload::ReloadCoordinator;

/// Wait for OS signals until a shutdown is requested, then trigger it.
#[cfg(unix)]
pub async fn handle_signals(coordinator: Arc<ReloadCoordinator>, shutdown: &Shutdown) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = terminate.recv() => break,
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading configuration");
                if let Err(e) = coordinator.reload_configuration().await {
                    tracing::error!(error = %e, "Failed to reload configuration. Keeping current configuration.");
                }
            }
        }
    }

    tracing::info!("Shutdown signal received");
    shutdown.trigger();
    Ok(())
}

/// Wait for Ctrl+C, then trigger shutdown.
#[cfg(not(unix))]
pub async fn handle_signals(_coordinator: Arc<ReloadCoordinator>, shutdown: &Shutdown) -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
    Ok(())
}
