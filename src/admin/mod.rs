//! Admin surface.
//!
//! The admin endpoints live in the dispatch table as reserved built-in
//! routes; [`handlers::handle`] executes them once the table has matched one.

pub mod handlers;

pub use handlers::handle;
