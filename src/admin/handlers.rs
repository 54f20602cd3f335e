use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::http::response;
use crate::reload::{ReloadCoordinator, ReloadError};
use crate::routing::matcher::PathParams;
use crate::routing::AdminOp;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ToggleResult {
    pub message: String,
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct ReloadResult {
    pub message: &'static str,
}

/// Run a built-in operation.
pub async fn handle(op: AdminOp, params: &PathParams, coordinator: &ReloadCoordinator) -> Response {
    match op {
        AdminOp::Health => get_health().into_response(),
        AdminOp::ListPlugins => list_plugins(coordinator).await,
        AdminOp::GetPlugin => get_plugin(coordinator, params.get("name").unwrap_or_default()).await,
        AdminOp::TogglePlugin => toggle_plugin(coordinator, params.get("name").unwrap_or_default()).await,
        AdminOp::Reload => reload(coordinator).await,
    }
}

pub fn get_health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

pub async fn list_plugins(coordinator: &ReloadCoordinator) -> Response {
    Json(coordinator.plugins().await).into_response()
}

pub async fn get_plugin(coordinator: &ReloadCoordinator, name: &str) -> Response {
    match coordinator.plugin(name).await {
        Some(plugin) => Json(plugin).into_response(),
        None => plugin_not_found(),
    }
}

pub async fn toggle_plugin(coordinator: &ReloadCoordinator, name: &str) -> Response {
    match coordinator.toggle_plugin(name).await {
        Ok(enabled) => {
            let state = if enabled { "enabled" } else { "disabled" };
            Json(ToggleResult {
                message: format!("Plugin {name} {state}"),
                enabled,
            })
            .into_response()
        }
        Err(ReloadError::PluginNotFound(_)) => plugin_not_found(),
        Err(e) => {
            tracing::error!(plugin = %name, error = %e, "Plugin toggle failed");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

pub async fn reload(coordinator: &ReloadCoordinator) -> Response {
    match coordinator.reload_all().await {
        Ok(()) => {
            tracing::info!("Plugins reloaded via admin API");
            Json(ReloadResult {
                message: "Plugins reloaded successfully",
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Plugin reload failed");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn plugin_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Plugin not found" }))).into_response()
}
