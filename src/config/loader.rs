//! Declaration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::schema::{PluginBundle, ServerConfig};
use crate::config::validation::{validate_config, validate_endpoints, ValidationError};

/// File extension of plugin bundle documents.
pub const PLUGIN_EXTENSION: &str = "json";

/// Error type for configuration and plugin loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("validation failed for {}: {}", .path.display(), join_errors(.errors))]
    Validation {
        path: PathBuf,
        errors: Vec<ValidationError>,
    },

    #[error("failed to serialize declarations: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load and validate the server configuration from a JSON file.
///
/// Empty `port` / `plugins_dir` fields are defaulted before validation.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    let mut config: ServerConfig = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.apply_defaults();

    validate_config(&config).map_err(|errors| ConfigError::Validation {
        path: path.to_path_buf(),
        errors,
    })?;

    Ok(config)
}

/// Load and validate one plugin bundle.
///
/// A bundle without a name takes the file stem (`users.json` → `users`).
pub fn load_plugin(path: &Path) -> Result<PluginBundle, ConfigError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    let mut plugin: PluginBundle = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if plugin.name.is_empty() {
        plugin.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    validate_endpoints(&plugin.endpoints).map_err(|errors| ConfigError::Validation {
        path: path.to_path_buf(),
        errors,
    })?;

    plugin.source = Some(path.to_path_buf());
    Ok(plugin)
}

/// Result of scanning a plugins directory.
#[derive(Debug, Default)]
pub struct PluginScan {
    /// Bundles that loaded, in file-name order.
    pub bundles: Vec<PluginBundle>,
    /// Files that were skipped, with the reason.
    pub failures: Vec<ConfigError>,
}

/// Scan a plugins directory for `*.json` bundles.
///
/// A missing directory yields an empty scan. Malformed files are reported in
/// [`PluginScan::failures`] and do not stop the scan.
pub fn scan_plugins(dir: &Path) -> Result<PluginScan, ConfigError> {
    if !dir.exists() {
        tracing::info!(dir = %dir.display(), "Plugins directory does not exist, skipping plugin loading");
        return Ok(PluginScan::default());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir && is_plugin_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut scan = PluginScan::default();
    for path in paths {
        match load_plugin(&path) {
            Ok(plugin) => {
                tracing::info!(
                    plugin = %plugin.name,
                    enabled = plugin.enabled,
                    endpoints = plugin.endpoints.len(),
                    "Loaded plugin"
                );
                scan.bundles.push(plugin);
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping plugin file");
                scan.failures.push(e);
            }
        }
    }

    Ok(scan)
}

/// True for paths with the plugin document extension.
pub fn is_plugin_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(PLUGIN_EXTENSION)
}

/// Write a plugin bundle back to disk as pretty-printed JSON.
pub fn save_plugin(plugin: &PluginBundle, path: &Path) -> Result<(), ConfigError> {
    write_json(plugin, path)
}

/// Write a server configuration to disk as pretty-printed JSON.
pub fn save_config(config: &ServerConfig, path: &Path) -> Result<(), ConfigError> {
    write_json(config, path)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ConfigError> {
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data).map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::EndpointDeclaration;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.json",
            json!({
                "port": "8080",
                "plugins_dir": "test-plugins",
                "endpoints": [
                    {"path": "/test", "method": "GET", "status_code": 200, "response": {"message": "test"}}
                ]
            }),
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.port, "8080");
        assert_eq!(config.plugins_dir, "test-plugins");
        assert_eq!(config.endpoints.len(), 1);
    }

    #[test]
    fn test_load_config_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.json", json!({ "endpoints": [] }));

        let config = load_config(&path).unwrap();
        assert_eq!(config.port, "9000");
        assert_eq!(config.plugins_dir, "plugins");
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_config(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));

        let garbled = dir.path().join("bad.json");
        fs::write(&garbled, "{ not json").unwrap();
        assert!(matches!(load_config(&garbled).unwrap_err(), ConfigError::Parse { .. }));

        let invalid = write(
            dir.path(),
            "invalid.json",
            json!({ "endpoints": [{"path": "relative", "method": "GET"}] }),
        );
        assert!(matches!(load_config(&invalid).unwrap_err(), ConfigError::Validation { .. }));
    }

    #[test]
    fn test_load_plugin_defaults_name_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "orders.json", json!({ "enabled": false, "endpoints": [] }));

        let plugin = load_plugin(&path).unwrap();
        assert_eq!(plugin.name, "orders");
        assert!(!plugin.enabled);
        assert_eq!(plugin.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_scan_skips_malformed_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a.json",
            json!({ "name": "alpha", "enabled": true, "endpoints": [
                {"path": "/alpha", "method": "GET", "response": "a"}
            ]}),
        );
        fs::write(dir.path().join("b.json"), "{ broken").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let scan = scan_plugins(dir.path()).unwrap();
        assert_eq!(scan.bundles.len(), 1);
        assert_eq!(scan.bundles[0].name, "alpha");
        assert_eq!(scan.failures.len(), 1);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let scan = scan_plugins(&dir.path().join("absent")).unwrap();
        assert!(scan.bundles.is_empty());
        assert!(scan.failures.is_empty());
    }

    #[test]
    fn test_save_plugin_preserves_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        let mut plugin = PluginBundle::new(
            "p",
            true,
            vec![EndpointDeclaration::new("POST", "/p", 201, json!({"message": "plugin"})).with_delay_ms(5)],
        );
        plugin.description = Some("demo".into());

        save_plugin(&plugin, &path).unwrap();
        let reloaded = load_plugin(&path).unwrap();

        assert_eq!(reloaded.name, plugin.name);
        assert_eq!(reloaded.description, plugin.description);
        assert_eq!(reloaded.endpoints, plugin.endpoints);
    }
}
