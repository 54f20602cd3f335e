//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Example files if missing → Load config → Load plugins → Compile table
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, watcher exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger config reload
//! ```
//!
//! # Design Decisions
//! - Ordered startup: declarations first, listener last
//! - An unreadable config is fatal at startup only

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
