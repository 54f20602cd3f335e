//! The single authority over declarations and the installed dispatch table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::RwLock;
use tokio::task::JoinError;

use crate::config::loader::{self, ConfigError, PluginScan};
use crate::config::schema::{PluginBundle, ServerConfig};
use crate::observability::metrics;
use crate::reload::store::DeclarationStore;
use crate::reload::ReloadError;
use crate::routing::DispatchTable;

/// Serializes every declaration mutation and table installation.
///
/// Mutations take the store's write lock for their whole duration, so two
/// triggers firing together (a file event and an admin call) run one after
/// the other. Request handlers only call [`ReloadCoordinator::table`], which
/// never touches the lock.
pub struct ReloadCoordinator {
    config_path: PathBuf,
    store: RwLock<DeclarationStore>,
    table: ArcSwap<DispatchTable>,
}

impl ReloadCoordinator {
    /// Create a coordinator for the given config file.
    ///
    /// The store starts with the default configuration and no plugins; call
    /// [`load_configuration`](Self::load_configuration),
    /// [`load_plugins`](Self::load_plugins) and [`rebuild`](Self::rebuild)
    /// to populate it.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self::with_store(config_path, DeclarationStore::default())
    }

    /// Create a coordinator around pre-populated declarations.
    pub fn with_store(config_path: impl Into<PathBuf>, store: DeclarationStore) -> Self {
        let table = store.compile();
        Self {
            config_path: config_path.into(),
            store: RwLock::new(store),
            table: ArcSwap::from_pointee(table),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Snapshot of the installed dispatch table.
    ///
    /// The snapshot stays valid for as long as the caller holds it, even if a
    /// newer table is installed meanwhile.
    pub fn table(&self) -> Arc<DispatchTable> {
        self.table.load_full()
    }

    /// Re-read the config file and replace the base configuration.
    pub async fn load_configuration(&self) -> Result<(), ReloadError> {
        let mut store = self.store.write().await;
        self.load_configuration_locked(&mut store).await
    }

    /// Rescan the plugins directory and replace the bundle set.
    ///
    /// Returns the number of bundles loaded.
    pub async fn load_plugins(&self) -> Result<usize, ReloadError> {
        let mut store = self.store.write().await;
        self.load_plugins_locked(&mut store).await
    }

    /// Compile the current declarations and install the result.
    pub async fn rebuild(&self) -> Arc<DispatchTable> {
        let store = self.store.write().await;
        self.rebuild_locked(&store)
    }

    /// Flip a plugin's enabled flag, persist it, and rebuild.
    ///
    /// A failed write-back is logged; the new state still takes effect.
    pub async fn toggle_plugin(&self, name: &str) -> Result<bool, ReloadError> {
        let mut store = self.store.write().await;
        let enabled = store.toggle(name)?;

        if let Some(plugin) = store.plugin(name) {
            let plugin = plugin.clone();
            let path = plugin
                .source
                .clone()
                .unwrap_or_else(|| store.configuration().plugins_dir().join(format!("{name}.{}", loader::PLUGIN_EXTENSION)));

            let written = tokio::task::spawn_blocking(move || loader::save_plugin(&plugin, &path)).await;
            report_write_back(name, written);
        }

        self.rebuild_locked(&store);
        tracing::info!(plugin = %name, enabled, "Plugin toggled");
        Ok(enabled)
    }

    /// Rescan plugins and rebuild.
    pub async fn reload_all(&self) -> Result<(), ReloadError> {
        let mut store = self.store.write().await;
        self.load_plugins_locked(&mut store).await?;
        self.rebuild_locked(&store);
        Ok(())
    }

    /// Reload the config file, rescan plugins and rebuild.
    ///
    /// If the config cannot be read nothing changes. A plugin scan failure is
    /// logged and the table is rebuilt with the previous bundles.
    pub async fn reload_configuration(&self) -> Result<(), ReloadError> {
        let mut store = self.store.write().await;
        self.load_configuration_locked(&mut store).await?;
        if let Err(e) = self.load_plugins_locked(&mut store).await {
            tracing::warn!(error = %e, "Failed to reload plugins after configuration change");
        }
        self.rebuild_locked(&store);
        Ok(())
    }

    /// Clone of the current plugin map.
    pub async fn plugins(&self) -> BTreeMap<String, PluginBundle> {
        self.store.read().await.plugins().clone()
    }

    pub async fn plugin(&self, name: &str) -> Option<PluginBundle> {
        self.store.read().await.plugin(name).cloned()
    }

    pub async fn configuration(&self) -> ServerConfig {
        self.store.read().await.configuration().clone()
    }

    pub async fn plugins_dir(&self) -> PathBuf {
        self.store.read().await.configuration().plugins_dir().to_path_buf()
    }

    async fn load_configuration_locked(&self, store: &mut DeclarationStore) -> Result<(), ReloadError> {
        let path = self.config_path.clone();
        let config = tokio::task::spawn_blocking(move || loader::load_config(&path))
            .await?
            .map_err(ReloadError::ConfigurationUnreadable)?;

        let plugins_dir = config.plugins_dir().to_path_buf();
        if let Err(e) = tokio::fs::create_dir_all(&plugins_dir).await {
            tracing::warn!(dir = %plugins_dir.display(), error = %e, "Failed to create plugins directory");
        }

        tracing::info!(
            path = %self.config_path.display(),
            port = %config.port,
            plugins_dir = %plugins_dir.display(),
            endpoints = config.endpoints.len(),
            "Configuration loaded"
        );
        store.set_configuration(config);
        Ok(())
    }

    async fn load_plugins_locked(&self, store: &mut DeclarationStore) -> Result<usize, ReloadError> {
        let dir = store.configuration().plugins_dir().to_path_buf();
        let scan_dir = dir.clone();
        let PluginScan { bundles, failures } = tokio::task::spawn_blocking(move || loader::scan_plugins(&scan_dir))
            .await?
            .map_err(|source| ReloadError::PluginsDirUnreadable { path: dir, source })?;

        for _ in &failures {
            metrics::record_plugin_load_failure();
        }

        store.replace_plugins(bundles);
        let count = store.plugins().len();
        tracing::info!(plugins = count, skipped = failures.len(), "Plugins loaded");
        Ok(count)
    }

    fn rebuild_locked(&self, store: &DeclarationStore) -> Arc<DispatchTable> {
        let table = Arc::new(store.compile());
        self.table.store(Arc::clone(&table));

        metrics::record_rebuild(table.declared_routes().len());
        tracing::debug!(
            revision = table.revision(),
            routes = table.len(),
            declared = table.declared_routes().len(),
            "Dispatch table installed"
        );
        table
    }
}

/// Log the outcome of a toggle write-back. Returns true if the file was written.
fn report_write_back(name: &str, written: Result<Result<(), ConfigError>, JoinError>) -> bool {
    match written {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::error!(plugin = %name, error = %e, "Failed to persist plugin state");
            false
        }
        Err(e) => {
            tracing::error!(plugin = %name, error = %e, "Plugin write-back task failed");
            false
        }
    }
}
