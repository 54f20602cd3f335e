//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the route answering a (method, path) pair
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Reserved built-in routes are consulted first and cannot be shadowed
//! - Among declared routes the last compiled match wins
//! - O(n) scan (acceptable for typical route counts)

use std::fmt;
use std::sync::Arc;

use crate::config::schema::EndpointDeclaration;
use crate::routing::matcher::{method_matches, PathParams, PathPattern};

/// Source label of the base configuration's routes.
pub const MAIN_SOURCE: &str = "main";

/// Where a compiled route came from. Used for logging and metrics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSource {
    Builtin,
    Main,
    Plugin(String),
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSource::Builtin => f.write_str("builtin"),
            RouteSource::Main => f.write_str(MAIN_SOURCE),
            RouteSource::Plugin(name) => f.write_str(name),
        }
    }
}

/// Fixed operations served by the built-in routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOp {
    Health,
    ListPlugins,
    GetPlugin,
    TogglePlugin,
    Reload,
}

/// What a matched route does.
#[derive(Debug, Clone)]
pub enum RouteAction {
    /// Serve the canned response of a declaration.
    Respond(Arc<EndpointDeclaration>),
    Admin(AdminOp),
}

/// A single entry of the dispatch table.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub method: String,
    pub pattern: PathPattern,
    pub action: RouteAction,
    pub source: RouteSource,
}

impl CompiledRoute {
    pub fn new(method: &str, pattern: &str, action: RouteAction, source: RouteSource) -> Self {
        Self {
            method: method.trim().to_ascii_uppercase(),
            pattern: PathPattern::parse(pattern),
            action,
            source,
        }
    }

    fn captures(&self, method: &str, path: &str) -> Option<PathParams> {
        if !method_matches(&self.method, method) {
            return None;
        }
        self.pattern.captures(path)
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a CompiledRoute,
    pub params: PathParams,
}

/// The immutable routing structure consulted by every request.
///
/// Built by [`crate::routing::compiler::compile`], installed by the reload
/// coordinator, and never mutated afterwards.
#[derive(Debug, Default)]
pub struct DispatchTable {
    routes: Vec<CompiledRoute>,
    /// Number of leading reserved (built-in) routes.
    reserved: usize,
    /// Store revision this table was compiled from.
    revision: u64,
}

impl DispatchTable {
    pub(crate) fn new(routes: Vec<CompiledRoute>, reserved: usize, revision: u64) -> Self {
        Self {
            routes,
            reserved,
            revision,
        }
    }

    /// Find the route answering `method` + `path`.
    pub fn lookup(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        let (builtin, declared) = self.routes.split_at(self.reserved);

        builtin
            .iter()
            .chain(declared.iter().rev())
            .find_map(|route| route.captures(method, path).map(|params| RouteMatch { route, params }))
    }

    /// All routes in compile order.
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// Declared (non built-in) routes in compile order.
    pub fn declared_routes(&self) -> &[CompiledRoute] {
        &self.routes[self.reserved..]
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
