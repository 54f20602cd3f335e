//! Startup orchestration.
//!
//! # Responsibilities
//! - Write example config and plugin files on first run
//! - Load declarations and compile the first dispatch table
//!
//! # Design Decisions
//! - Fail fast: an unreadable config at startup is fatal
//! - A plugin scan failure at startup is only a warning

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::config::loader::{save_config, save_plugin, ConfigError, PLUGIN_EXTENSION};
use crate::config::schema::{EndpointDeclaration, PluginBundle, ServerConfig};
use crate::reload::{ReloadCoordinator, ReloadError};

/// Name of the example plugin written next to the example config.
pub const EXAMPLE_PLUGIN: &str = "example-plugin";

/// Load declarations from `config_path` and install the first table.
pub async fn bootstrap(config_path: &Path) -> Result<Arc<ReloadCoordinator>, ReloadError> {
    let coordinator = Arc::new(ReloadCoordinator::new(config_path));

    coordinator.load_configuration().await?;
    if let Err(e) = coordinator.load_plugins().await {
        tracing::warn!(error = %e, "Failed to load plugins");
    }
    let table = coordinator.rebuild().await;

    tracing::info!(
        routes = table.declared_routes().len(),
        plugins = coordinator.plugins().await.len(),
        "Routes compiled"
    );
    Ok(coordinator)
}

/// Write an example configuration and an example plugin.
pub fn write_example_files(config_path: &Path) -> Result<(), ConfigError> {
    let config = example_config();
    save_config(&config, config_path)?;

    let plugins_dir = config.plugins_dir();
    std::fs::create_dir_all(plugins_dir).map_err(|source| ConfigError::Io {
        path: plugins_dir.to_path_buf(),
        source,
    })?;
    let plugin_path = plugins_dir.join(format!("{EXAMPLE_PLUGIN}.{PLUGIN_EXTENSION}"));
    save_plugin(&example_plugin(), &plugin_path)
}

fn example_config() -> ServerConfig {
    ServerConfig {
        endpoints: vec![
            EndpointDeclaration::new(
                "GET",
                "/api/users",
                200,
                json!([
                    {"id": 1, "name": "John Doe", "email": "john@example.com"},
                    {"id": 2, "name": "Jane Smith", "email": "jane@example.com"}
                ]),
            )
            .with_header("Content-Type", "application/json"),
            EndpointDeclaration::new(
                "GET",
                "/api/users/{id}",
                200,
                json!({"id": 1, "name": "John Doe", "email": "john@example.com"}),
            ),
        ],
        ..ServerConfig::default()
    }
}

fn example_plugin() -> PluginBundle {
    let mut plugin = PluginBundle::new(
        EXAMPLE_PLUGIN,
        true,
        vec![
            EndpointDeclaration::new(
                "GET",
                "/api/products",
                200,
                json!([
                    {"id": 1, "name": "Product A", "price": 99.99},
                    {"id": 2, "name": "Product B", "price": 149.99}
                ]),
            ),
            EndpointDeclaration::new(
                "GET",
                "/api/products/{id}",
                200,
                json!({"id": 1, "name": "Product A", "price": 99.99}),
            ),
            EndpointDeclaration::new(
                "POST",
                "/api/products",
                201,
                json!({"id": 3, "message": "Product created successfully"}),
            )
            .with_delay_ms(300),
        ],
    );
    plugin.description = Some("Example plugin demonstrating various API endpoints".to_string());
    plugin
}
