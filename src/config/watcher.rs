//! File watcher for hot reload of the config file and plugin bundles.
//!
//! # Data Flow
//! ```text
//! notify (own thread) ──events──▶ mpsc ──▶ watcher task
//!                                             │ classify + coalesce
//!                                             ▼
//!                              ReloadCoordinator::reload_configuration
//!                              ReloadCoordinator::reload_all
//! ```
//!
//! # Design Decisions
//! - Directories are watched non-recursively; the config file's directory
//!   is watched so editors that recreate the file are still seen
//! - Only write/create on the exact config path triggers a config reload;
//!   rename-based saves are not followed
//! - Events that arrive while the settle window is open are merged into one
//!   reload, which still starts after every one of them

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::loader::is_plugin_file;
use crate::reload::ReloadCoordinator;

/// Default time to wait for related events before reloading.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Failure to set up file watching. Hot reload is unavailable.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("file watching unavailable: {0}")]
    Unavailable(#[from] notify::Error),
}

/// What a batch of file events requires.
///
/// Ordered so that merging keeps the broader reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReloadTrigger {
    /// Rescan plugins and rebuild.
    Plugins,
    /// Reload config, rescan plugins and rebuild.
    Configuration,
}

/// Decides which file events matter.
#[derive(Debug, Clone)]
pub struct EventFilter {
    config_file: PathBuf,
    plugins_dir: Option<PathBuf>,
}

impl EventFilter {
    pub fn new(config_file: &Path, plugins_dir: Option<&Path>) -> Self {
        Self {
            config_file: resolve_file(config_file),
            plugins_dir: plugins_dir.map(resolve_dir),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn plugins_dir(&self) -> Option<&Path> {
        self.plugins_dir.as_deref()
    }

    /// Classify one event. Unrelated paths and kinds yield `None`.
    pub fn classify(&self, event: &Event) -> Option<ReloadTrigger> {
        let is_write = matches!(event.kind, EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any));
        let is_create = matches!(event.kind, EventKind::Create(_));
        let is_remove = matches!(event.kind, EventKind::Remove(_));

        event
            .paths
            .iter()
            .filter_map(|path| {
                if path == &self.config_file && (is_write || is_create) {
                    return Some(ReloadTrigger::Configuration);
                }
                let in_plugins_dir = self.plugins_dir.as_deref().is_some_and(|dir| path.parent() == Some(dir));
                if in_plugins_dir && is_plugin_file(path) && (is_write || is_create || is_remove) {
                    return Some(ReloadTrigger::Plugins);
                }
                None
            })
            .max()
    }
}

/// Absolute form of a directory, resolving symlinks when it exists.
fn resolve_dir(dir: &Path) -> PathBuf {
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    dir.canonicalize().unwrap_or_else(|_| std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf()))
}

/// Absolute form of a file path whose file may not exist yet.
fn resolve_file(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => resolve_dir(parent).join(name),
        _ => path.to_path_buf(),
    }
}

/// Watches the config file and plugins directory and drives reloads.
pub struct ChangeWatcher {
    coordinator: Arc<ReloadCoordinator>,
    filter: EventFilter,
    settle: Duration,
}

impl ChangeWatcher {
    pub async fn new(coordinator: Arc<ReloadCoordinator>) -> Self {
        let plugins_dir = coordinator.plugins_dir().await;
        let filter = EventFilter::new(coordinator.config_path(), Some(plugins_dir.as_path()));
        Self {
            coordinator,
            filter,
            settle: DEFAULT_SETTLE,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Start watching and spawn the event loop.
    ///
    /// Fails only if the config directory cannot be watched; an unwatchable
    /// plugins directory is logged and skipped.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> Result<JoinHandle<()>, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let config_dir = self
            .filter
            .config_file()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        watcher.watch(&config_dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %config_dir.display(), "Watching config directory");

        let mut this = self;
        if let Some(dir) = this.filter.plugins_dir.clone() {
            if !watch_plugins_dir(&mut watcher, &dir) {
                this.filter.plugins_dir = None;
            }
        }

        Ok(tokio::spawn(this.run(watcher, rx, shutdown)))
    }

    async fn run(
        mut self,
        mut watcher: RecommendedWatcher,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            let first = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                _ = shutdown.recv() => break,
            };

            let Some(mut trigger) = self.classify_result(first) else {
                continue;
            };

            if !self.settle.is_zero() {
                tokio::time::sleep(self.settle).await;
            }
            while let Ok(event) = events.try_recv() {
                if let Some(next) = self.classify_result(event) {
                    trigger = trigger.max(next);
                }
            }

            self.apply(trigger, &mut watcher).await;
        }

        tracing::info!("Change watcher stopped");
    }

    fn classify_result(&self, result: notify::Result<Event>) -> Option<ReloadTrigger> {
        match result {
            Ok(event) => {
                let trigger = self.filter.classify(&event);
                if trigger.is_some() {
                    tracing::debug!(kind = ?event.kind, paths = ?event.paths, "Relevant file event");
                }
                trigger
            }
            Err(e) => {
                tracing::error!(error = %e, "File watcher error");
                None
            }
        }
    }

    async fn apply(&mut self, trigger: ReloadTrigger, watcher: &mut RecommendedWatcher) {
        match trigger {
            ReloadTrigger::Configuration => {
                tracing::info!(path = %self.filter.config_file().display(), "Config file changed, reloading");
                match self.coordinator.reload_configuration().await {
                    Ok(()) => {
                        tracing::info!("Configuration reloaded successfully");
                        self.follow_plugins_dir(watcher).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to reload configuration. Keeping current configuration.")
                    }
                }
            }
            ReloadTrigger::Plugins => {
                tracing::info!("Plugin files changed, reloading");
                match self.coordinator.reload_all().await {
                    Ok(()) => tracing::info!("Plugins reloaded successfully"),
                    Err(e) => tracing::error!(error = %e, "Failed to reload plugins"),
                }
            }
        }
    }

    /// Move the plugins watch if the reloaded config points elsewhere.
    async fn follow_plugins_dir(&mut self, watcher: &mut RecommendedWatcher) {
        let current = resolve_dir(&self.coordinator.plugins_dir().await);
        if self.filter.plugins_dir() == Some(current.as_path()) {
            return;
        }

        if let Some(old) = self.filter.plugins_dir.take() {
            if let Err(e) = watcher.unwatch(&old) {
                tracing::debug!(path = %old.display(), error = %e, "Failed to unwatch old plugins directory");
            }
        }
        if watch_plugins_dir(watcher, &current) {
            self.filter.plugins_dir = Some(current);
        }
    }
}

fn watch_plugins_dir(watcher: &mut RecommendedWatcher, dir: &Path) -> bool {
    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "Plugins directory missing, plugin hot reload disabled");
        return false;
    }
    match watcher.watch(dir, RecursiveMode::NonRecursive) {
        Ok(()) => {
            tracing::info!(path = %dir.display(), "Watching plugins directory");
            true
        }
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Failed to watch plugins directory");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

    fn event(kind: EventKind, path: &Path) -> Event {
        Event::new(kind).add_path(path.to_path_buf())
    }

    fn setup() -> (tempfile::TempDir, EventFilter, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let plugins = dir.path().join("plugins");
        std::fs::create_dir(&plugins).unwrap();
        let config = dir.path().join("config.json");

        let filter = EventFilter::new(&config, Some(plugins.as_path()));
        let config = filter.config_file().to_path_buf();
        let plugins = filter.plugins_dir().unwrap().to_path_buf();
        (dir, filter, config, plugins)
    }

    #[test]
    fn test_config_events() {
        let (_dir, filter, config, _) = setup();
        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));

        assert_eq!(filter.classify(&event(write, &config)), Some(ReloadTrigger::Configuration));
        assert_eq!(
            filter.classify(&event(EventKind::Create(CreateKind::File), &config)),
            Some(ReloadTrigger::Configuration)
        );
        assert_eq!(filter.classify(&event(EventKind::Remove(RemoveKind::File), &config)), None);
        assert_eq!(
            filter.classify(&event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &config)),
            None
        );
    }

    #[test]
    fn test_plugin_events() {
        let (_dir, filter, _, plugins) = setup();
        let bundle = plugins.join("p.json");

        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Modify(ModifyKind::Any),
            EventKind::Remove(RemoveKind::File),
        ] {
            assert_eq!(filter.classify(&event(kind, &bundle)), Some(ReloadTrigger::Plugins));
        }

        let write = EventKind::Modify(ModifyKind::Data(DataChange::Any));
        assert_eq!(filter.classify(&event(write, &plugins.join("notes.txt"))), None);
        assert_eq!(filter.classify(&event(write, &plugins.join("nested").join("p.json"))), None);
        assert_eq!(
            filter.classify(&event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), &bundle)),
            None
        );
        assert_eq!(filter.classify(&event(EventKind::Access(AccessKind::Any), &bundle)), None);
    }

    #[test]
    fn test_unrelated_paths_ignored() {
        let (dir, filter, _, _) = setup();
        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));

        let other = filter.config_file().parent().unwrap().join("other.json");
        assert_eq!(filter.classify(&event(write, &other)), None);
        assert_eq!(filter.classify(&event(write, &dir.path().join("elsewhere/config.json"))), None);
    }

    #[test]
    fn test_multi_path_event_keeps_broader_trigger() {
        let (_dir, filter, config, plugins) = setup();
        let event = Event::new(EventKind::Create(CreateKind::Any))
            .add_path(plugins.join("a.json"))
            .add_path(config);

        assert_eq!(filter.classify(&event), Some(ReloadTrigger::Configuration));
        assert!(ReloadTrigger::Configuration > ReloadTrigger::Plugins);
    }

    #[test]
    fn test_without_plugins_dir() {
        let dir = tempfile::tempdir().unwrap();
        let filter = EventFilter::new(&dir.path().join("config.json"), None);
        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));

        assert_eq!(filter.classify(&event(write, &dir.path().join("p.json"))), None);
    }
}
