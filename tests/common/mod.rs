//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use mock_server::config::loader::{save_config, save_plugin};
use mock_server::lifecycle::startup::bootstrap;
use mock_server::{ChangeWatcher, EndpointDeclaration, HttpServer, PluginBundle, ReloadCoordinator, ServerConfig, Shutdown};

/// A running server over a temporary config directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub coordinator: Arc<ReloadCoordinator>,
    pub shutdown: Shutdown,
    pub dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.dir.path().join("plugins")
    }

    /// Write a plugin bundle as `<plugins>/<name>.json`.
    pub fn write_plugin(&self, plugin: &PluginBundle) {
        write_plugin(&self.plugins_dir(), plugin);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn write_plugin(plugins_dir: &Path, plugin: &PluginBundle) {
    save_plugin(plugin, &plugins_dir.join(format!("{}.json", plugin.name))).unwrap();
}

/// Write the config and plugins, then start the server on an ephemeral port.
pub async fn start_server(endpoints: Vec<EndpointDeclaration>, plugins: &[PluginBundle]) -> TestServer {
    start(endpoints, plugins, false).await
}

/// Like [`start_server`], with the change watcher running.
pub async fn start_watched_server(endpoints: Vec<EndpointDeclaration>, plugins: &[PluginBundle]) -> TestServer {
    start(endpoints, plugins, true).await
}

async fn start(endpoints: Vec<EndpointDeclaration>, plugins: &[PluginBundle], watch: bool) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let plugins_dir = dir.path().join("plugins");
    std::fs::create_dir_all(&plugins_dir).unwrap();

    let config = ServerConfig {
        port: "0".to_string(),
        plugins_dir: plugins_dir.to_string_lossy().into_owned(),
        endpoints,
    };
    save_config(&config, &config_path).unwrap();
    for plugin in plugins {
        write_plugin(&plugins_dir, plugin);
    }

    let coordinator = bootstrap(&config_path).await.unwrap();
    let shutdown = Shutdown::new();

    if watch {
        ChangeWatcher::new(coordinator.clone())
            .await
            .spawn(shutdown.subscribe())
            .unwrap();
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(coordinator.clone());
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        coordinator,
        shutdown,
        dir,
    }
}

/// Send a request and return status and JSON body (`Null` if not JSON).
pub async fn send(method: reqwest::Method, url: &str) -> (u16, Value) {
    let response = reqwest::Client::new().request(method, url).send().await.unwrap();
    let status = response.status().as_u16();
    let text = response.text().await.unwrap();
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}
