//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (on every rebuild):
//!     ServerConfig.endpoints + enabled PluginBundles
//!     → compiler.rs (built-ins, then "main", then plugins)
//!     → Freeze as immutable DispatchTable
//!
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (method + segment pattern)
//!     → Return: matched route + captured params, or NoMatch
//! ```
//!
//! # Design Decisions
//! - Tables are rebuilt wholesale and swapped, never patched in place
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same declarations always produce the same table

pub mod compiler;
pub mod matcher;
pub mod router;

pub use compiler::compile;
pub use router::{AdminOp, CompiledRoute, DispatchTable, RouteAction, RouteMatch, RouteSource};
