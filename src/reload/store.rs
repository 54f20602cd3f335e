//! In-memory declaration store.
//!
//! Holds the base configuration and the loaded plugin bundles. The store is
//! plain data: the reload coordinator owns it behind its writer lock and is
//! the only caller of the mutators.

use std::collections::BTreeMap;

use crate::config::schema::{PluginBundle, ServerConfig};
use crate::reload::ReloadError;
use crate::routing::{compile, DispatchTable};

/// Base configuration + plugin bundles keyed by name.
///
/// Bundles are kept in a `BTreeMap`, so plugins compile in lexicographic name
/// order and a later name shadows an earlier one on route collisions.
#[derive(Debug, Default)]
pub struct DeclarationStore {
    config: ServerConfig,
    plugins: BTreeMap<String, PluginBundle>,
    revision: u64,
}

impl DeclarationStore {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            plugins: BTreeMap::new(),
            revision: 0,
        }
    }

    /// Replace the base configuration.
    pub fn set_configuration(&mut self, config: ServerConfig) {
        self.config = config;
        self.revision += 1;
    }

    /// Replace the entire plugin set. Later bundles win on duplicate names.
    pub fn replace_plugins(&mut self, bundles: impl IntoIterator<Item = PluginBundle>) {
        let mut plugins = BTreeMap::new();
        for bundle in bundles {
            let name = bundle.name.clone();
            if let Some(previous) = plugins.insert(name.clone(), bundle) {
                tracing::warn!(
                    plugin = %name,
                    replaced = ?previous.source,
                    "Duplicate plugin name, keeping the later bundle"
                );
            }
        }
        self.plugins = plugins;
        self.revision += 1;
    }

    /// Flip a bundle's enabled flag, returning the new state.
    pub fn toggle(&mut self, name: &str) -> Result<bool, ReloadError> {
        let plugin = self
            .plugins
            .get_mut(name)
            .ok_or_else(|| ReloadError::PluginNotFound(name.to_string()))?;
        plugin.enabled = !plugin.enabled;
        let enabled = plugin.enabled;
        self.revision += 1;
        Ok(enabled)
    }

    pub fn configuration(&self) -> &ServerConfig {
        &self.config
    }

    pub fn plugins(&self) -> &BTreeMap<String, PluginBundle> {
        &self.plugins
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginBundle> {
        self.plugins.get(name)
    }

    /// Incremented on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Compile the current contents into a dispatch table.
    pub fn compile(&self) -> DispatchTable {
        compile(&self.config.endpoints, self.plugins.values(), self.revision)
    }
}
