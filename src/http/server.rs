//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler as sole entry point
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener with graceful shutdown
//! - Dispatch requests through the currently installed route table

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response;
use crate::observability::metrics;
use crate::reload::ReloadCoordinator;
use crate::routing::matcher::decode_path;
use crate::routing::RouteAction;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ReloadCoordinator>,
}

/// HTTP server for the mock responder.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving the coordinator's route table.
    pub fn new(coordinator: Arc<ReloadCoordinator>) -> Self {
        let state = AppState { coordinator };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every request falls through to [`dispatch_handler`]; routing is done
    /// against the swappable table, not by Axum.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for serving through other means (e.g. tests).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main dispatch handler.
/// Looks up the route in the installed table and executes it.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().as_str().to_string();
    let raw_path = request.uri().path().to_string();
    let path = decode_path(&raw_path);

    // Snapshot for the whole request; a concurrent rebuild does not affect it.
    let table = state.coordinator.table();

    let Some(matched) = table.lookup(&method, &raw_path) else {
        tracing::info!(request_id = %request_id, method = %method, path = %path, status = 404, "No route matched");
        metrics::record_request(&method, 404, "none", start_time);
        return response::not_found(&path);
    };

    let source = matched.route.source.to_string();
    let response = match &matched.route.action {
        RouteAction::Respond(endpoint) => response::execute(endpoint).await,
        RouteAction::Admin(op) => admin::handle(*op, &matched.params, &state.coordinator).await,
    };

    let status = response.status().as_u16();
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        source = %source,
        "Request served"
    );
    metrics::record_request(&method, status, &source, start_time);

    response
}
