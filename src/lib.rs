//! Hot-reloading HTTP mock server library.
//!
//! Serves canned responses declared in a JSON config file and in plugin
//! bundles, and recompiles its routing table whenever those files change.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod routing;

pub use config::schema::{EndpointDeclaration, PluginBundle, ResponseBody, ServerConfig};
pub use config::watcher::ChangeWatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use reload::ReloadCoordinator;
