//! Route compilation.
//!
//! Turns the current declarations into a fresh [`DispatchTable`]:
//!
//! ```text
//! built-in routes (health + admin, reserved)
//!     → base endpoints        (source "main")
//!     → enabled plugin endpoints, in the order given (source = plugin name)
//! ```
//!
//! Compilation is pure and never fails. Later routes shadow earlier ones with
//! the same method and path; nothing is deduplicated here.

use std::sync::Arc;

use crate::config::schema::{EndpointDeclaration, PluginBundle};
use crate::routing::router::{AdminOp, CompiledRoute, DispatchTable, RouteAction, RouteSource};

/// Fixed routes installed ahead of any declaration.
const BUILTIN_ROUTES: &[(&str, &str, AdminOp)] = &[
    ("GET", "/health", AdminOp::Health),
    ("GET", "/_admin/plugins", AdminOp::ListPlugins),
    ("GET", "/_admin/plugins/{name}", AdminOp::GetPlugin),
    ("POST", "/_admin/plugins/{name}/toggle", AdminOp::TogglePlugin),
    ("POST", "/_admin/reload", AdminOp::Reload),
];

/// Compile base endpoints and plugin bundles into a dispatch table.
///
/// Disabled bundles contribute nothing. `revision` is recorded on the table
/// so callers can tell which store state it was built from.
pub fn compile<'a>(
    base: &[EndpointDeclaration],
    plugins: impl IntoIterator<Item = &'a PluginBundle>,
    revision: u64,
) -> DispatchTable {
    let mut routes: Vec<CompiledRoute> = BUILTIN_ROUTES
        .iter()
        .map(|(method, path, op)| CompiledRoute::new(method, path, RouteAction::Admin(*op), RouteSource::Builtin))
        .collect();
    let reserved = routes.len();

    routes.extend(base.iter().map(|endpoint| declared(endpoint, RouteSource::Main)));

    for plugin in plugins.into_iter().filter(|p| p.enabled) {
        routes.extend(
            plugin
                .endpoints
                .iter()
                .map(|endpoint| declared(endpoint, RouteSource::Plugin(plugin.name.clone()))),
        );
    }

    DispatchTable::new(routes, reserved, revision)
}

fn declared(endpoint: &EndpointDeclaration, source: RouteSource) -> CompiledRoute {
    CompiledRoute::new(
        &endpoint.method,
        &endpoint.path,
        RouteAction::Respond(Arc::new(endpoint.clone())),
        source,
    )
}
