//! Hot-reloading HTTP mock server.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.json ─┐                      ┌──────────────────────────────┐
//!   plugins/*.json ─▶ ChangeWatcher ───▶│      ReloadCoordinator       │
//!                                       │  DeclarationStore (RwLock)   │
//!   /_admin/* ──────────────────────────▶│  DispatchTable (ArcSwap)     │
//!                                       └──────────────┬───────────────┘
//!                                                      │ snapshot
//!     Client Request    ┌─────────┐    ┌──────────┐    ▼
//!     ─────────────────▶│  http   │───▶│ dispatch │──▶ canned response
//!                       │ server  │    │ handler  │    or admin op
//!                       └─────────┘    └──────────┘
//! ```
//!
//! # Startup Sequence
//! 1. Example files are written if the config file is missing
//! 2. Config and plugins are loaded and the first table is compiled
//! 3. The listener binds and the change watcher starts
//! 4. Signals drive shutdown (SIGINT/SIGTERM) and reload (SIGHUP)

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mock_server::config::editor::{parse_headers, parse_response, upsert_endpoint, Upsert, DEFAULT_RESPONSE};
use mock_server::config::schema::EndpointDeclaration;
use mock_server::lifecycle::signals::handle_signals;
use mock_server::lifecycle::startup::{bootstrap, write_example_files};
use mock_server::observability::{logging, metrics};
use mock_server::{ChangeWatcher, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "mock-server")]
#[command(about = "HTTP mock server with hot-reloadable endpoints and plugins", long_about = None)]
struct Args {
    /// Config file path (takes precedence over --config)
    config_file: Option<PathBuf>,

    /// Config file path
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,

    /// Add or update an endpoint in the config file and exit
    #[arg(long, requires = "path")]
    add_endpoint: bool,

    /// Endpoint path (with --add-endpoint)
    #[arg(long)]
    path: Option<String>,

    /// HTTP method (with --add-endpoint)
    #[arg(long, default_value = "GET")]
    method: String,

    /// Status code (with --add-endpoint)
    #[arg(long, default_value_t = 200)]
    status: u16,

    /// Response body, JSON or raw text (with --add-endpoint)
    #[arg(long, default_value = DEFAULT_RESPONSE)]
    response: String,

    /// Headers as key1:value1,key2:value2 (with --add-endpoint)
    #[arg(long, default_value = "")]
    headers: String,

    /// Delay in milliseconds (with --add-endpoint)
    #[arg(long, default_value_t = 0)]
    delay: u64,
}

impl Args {
    fn config_path(&self) -> PathBuf {
        self.config_file.clone().unwrap_or_else(|| self.config.clone())
    }

    fn endpoint(&self) -> Option<EndpointDeclaration> {
        let path = self.path.as_deref()?;
        let mut endpoint = EndpointDeclaration::new(&self.method, path, self.status, parse_response(&self.response))
            .with_delay_ms(self.delay);
        endpoint.headers = parse_headers(&self.headers);
        Some(endpoint)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_logging();

    let config_path = args.config_path();

    if args.add_endpoint {
        let endpoint = args.endpoint().ok_or("--path is required with --add-endpoint")?;
        let (method, path) = (endpoint.normalized_method(), endpoint.path.clone());
        let verb = match upsert_endpoint(&config_path, endpoint)? {
            Upsert::Added => "Added",
            Upsert::Updated => "Updated",
        };
        println!("{verb} endpoint {method} {path} in {}", config_path.display());
        return Ok(());
    }

    tracing::info!("mock-server v{} starting", env!("CARGO_PKG_VERSION"));

    if !config_path.exists() {
        tracing::info!(path = %config_path.display(), "Config file not found, writing example configuration");
        write_example_files(&config_path)?;
    }

    let coordinator = bootstrap(&config_path).await?;

    if let Some(addr) = args.metrics_addr {
        metrics::init_metrics(addr);
    }

    let port = coordinator.configuration().await.port;
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(address = %listener.local_addr()?, config = %config_path.display(), "Listening for connections");

    let shutdown = Shutdown::new();

    let watcher = ChangeWatcher::new(coordinator.clone()).await;
    let watcher_task = match watcher.spawn(shutdown.subscribe()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::error!(error = %e, "Hot reload disabled");
            None
        }
    };

    let signal_shutdown = shutdown.clone();
    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        if let Err(e) = handle_signals(signal_coordinator, &signal_shutdown).await {
            tracing::error!(error = %e, "Signal handling failed");
            signal_shutdown.trigger();
        }
    });

    let server = HttpServer::new(coordinator);
    let served = server.run(listener, shutdown.subscribe()).await;
    shutdown.trigger();
    served?;

    if let Some(task) = watcher_task {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
