//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file / plugin files (JSON)
//!     → loader.rs (parse & deserialize, apply defaults)
//!     → validation.rs (semantic checks)
//!     → ServerConfig / PluginBundle (validated)
//!     → handed to the reload coordinator's declaration store
//!
//! On file change:
//!     watcher.rs detects change
//!     → reload coordinator reloads config and/or plugins
//!     → route table recompiled and swapped atomically
//! ```
//!
//! # Design Decisions
//! - Declarations are immutable once loaded; changes require full reload
//! - All config fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod editor;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{EndpointDeclaration, PluginBundle, ResponseBody, ServerConfig};
