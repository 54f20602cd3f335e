//! Reload subsystem.
//!
//! # Data Flow
//! ```text
//! Producers:
//!     config/watcher.rs (file events)  ─┐
//!     admin handlers (toggle, reload)  ─┼─▶ ReloadCoordinator (single writer)
//!     startup                          ─┘        │
//!                                                ├─ DeclarationStore (mutate)
//!                                                ├─ routing::compile
//!                                                └─ ArcSwap<DispatchTable> (install)
//!
//! Readers:
//!     request handlers → coordinator.table() (lock-free Arc snapshot)
//! ```
//!
//! # Design Decisions
//! - One writer section per operation; composite reloads hold it throughout
//! - Requests never take the writer lock; they keep their snapshot until done
//! - Reloads are at-least-once and uninterruptible: a second trigger waits

pub mod coordinator;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::loader::ConfigError;

pub use coordinator::ReloadCoordinator;
pub use store::DeclarationStore;

/// Errors surfaced by reload operations.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("configuration unreadable: {0}")]
    ConfigurationUnreadable(#[source] ConfigError),

    #[error("plugins directory {} unreadable: {source}", .path.display())]
    PluginsDirUnreadable {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("background I/O task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
