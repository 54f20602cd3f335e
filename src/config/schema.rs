//! Configuration schema definitions.
//!
//! This module defines the declaration documents the server is driven by:
//! the base [`ServerConfig`] and the per-file [`PluginBundle`]s.
//! All types derive Serde traits for (de)serialization from JSON files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Port used when the configuration leaves it empty.
pub const DEFAULT_PORT: &str = "9000";

/// Plugins directory used when the configuration leaves it empty.
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Root configuration for the server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen port (e.g., "9000").
    pub port: String,

    /// Directory scanned for plugin bundles.
    pub plugins_dir: String,

    /// Base endpoint declarations, compiled with source label "main".
    pub endpoints: Vec<EndpointDeclaration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            plugins_dir: DEFAULT_PLUGINS_DIR.to_string(),
            endpoints: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Fill in empty fields with their defaults.
    pub fn apply_defaults(&mut self) {
        if self.port.trim().is_empty() {
            self.port = DEFAULT_PORT.to_string();
        }
        if self.plugins_dir.trim().is_empty() {
            self.plugins_dir = DEFAULT_PLUGINS_DIR.to_string();
        }
    }

    pub fn plugins_dir(&self) -> &Path {
        Path::new(&self.plugins_dir)
    }
}

/// A named, independently toggleable group of endpoint declarations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginBundle {
    /// Bundle identity. Defaulted from the file stem when absent.
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Endpoints are only routable while this is true.
    pub enabled: bool,

    #[serde(default)]
    pub endpoints: Vec<EndpointDeclaration>,

    /// File the bundle was loaded from. Toggles are written back here.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl PluginBundle {
    pub fn new(name: impl Into<String>, enabled: bool, endpoints: Vec<EndpointDeclaration>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled,
            endpoints,
            source: None,
        }
    }
}

/// One declared endpoint: method + path pattern mapped to a canned response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EndpointDeclaration {
    /// Path pattern; `{name}` segments match any non-empty value.
    #[serde(default)]
    pub path: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Zero means 200.
    #[serde(default)]
    pub status_code: u16,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub response: ResponseBody,

    /// Delay in milliseconds before any output is produced.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub delay: u64,
}

fn default_method() -> String {
    "GET".to_string()
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl EndpointDeclaration {
    pub fn new(method: &str, path: &str, status_code: u16, response: impl Into<ResponseBody>) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            status_code,
            headers: BTreeMap::new(),
            response: response.into(),
            delay: 0,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_delay_ms(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }

    /// Upper-cased method used for matching.
    pub fn normalized_method(&self) -> String {
        self.method.trim().to_ascii_uppercase()
    }

    /// Effective status code (0 falls back to 200).
    pub fn status(&self) -> StatusCode {
        match self.status_code {
            0 => StatusCode::OK,
            code => StatusCode::from_u16(code).unwrap_or(StatusCode::OK),
        }
    }

    pub fn delay(&self) -> Option<Duration> {
        (self.delay > 0).then(|| Duration::from_millis(self.delay))
    }
}

/// Response payload of a declaration.
///
/// A JSON string in the document becomes [`ResponseBody::Raw`] and is written
/// verbatim; anything else is re-serialized as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Raw(String),
    Structured(Value),
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Structured(Value::Null)
    }
}

impl From<Value> for ResponseBody {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ResponseBody::Raw(s),
            other => ResponseBody::Structured(other),
        }
    }
}

impl From<&str> for ResponseBody {
    fn from(value: &str) -> Self {
        ResponseBody::Raw(value.to_string())
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        ResponseBody::Raw(value)
    }
}

impl ResponseBody {
    /// Bytes written to the client.
    ///
    /// Structured values are JSON-encoded with a trailing newline; `null`
    /// produces an empty body.
    pub fn render(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            ResponseBody::Raw(text) => Ok(text.as_bytes().to_vec()),
            ResponseBody::Structured(Value::Null) => Ok(Vec::new()),
            ResponseBody::Structured(value) => {
                let mut bytes = serde_json::to_vec(value)?;
                bytes.push(b'\n');
                Ok(bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_defaults() {
        let endpoint: EndpointDeclaration =
            serde_json::from_value(json!({ "path": "/x" })).unwrap();

        assert_eq!(endpoint.method, "GET");
        assert_eq!(endpoint.status(), StatusCode::OK);
        assert!(endpoint.headers.is_empty());
        assert_eq!(endpoint.response, ResponseBody::Structured(Value::Null));
        assert_eq!(endpoint.delay(), None);
    }

    #[test]
    fn test_response_variants() {
        let raw: EndpointDeclaration = serde_json::from_value(json!({
            "path": "/raw", "method": "get", "response": "Hello, World!"
        }))
        .unwrap();
        assert_eq!(raw.response, ResponseBody::Raw("Hello, World!".into()));
        assert_eq!(raw.normalized_method(), "GET");

        let structured: EndpointDeclaration = serde_json::from_value(json!({
            "path": "/json", "method": "POST", "response": {"id": 1}
        }))
        .unwrap();
        assert_eq!(structured.response, ResponseBody::Structured(json!({"id": 1})));
    }

    #[test]
    fn test_render() {
        assert_eq!(ResponseBody::Raw("a \"b\"".into()).render().unwrap(), b"a \"b\"");
        assert!(ResponseBody::default().render().unwrap().is_empty());

        let bytes = ResponseBody::Structured(json!({"message": "test"})).render().unwrap();
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, json!({"message": "test"}));
    }

    #[test]
    fn test_plugin_serialization_omits_empty_fields() {
        let plugin = PluginBundle::new(
            "p1",
            true,
            vec![EndpointDeclaration::new("GET", "/a", 200, json!({"ok": true}))],
        );
        let value = serde_json::to_value(&plugin).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "p1",
                "enabled": true,
                "endpoints": [
                    {"path": "/a", "method": "GET", "status_code": 200, "response": {"ok": true}}
                ]
            })
        );
    }

    #[test]
    fn test_plugin_requires_enabled() {
        let result: Result<PluginBundle, _> = serde_json::from_value(json!({ "name": "p" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_defaults() {
        let mut config: ServerConfig =
            serde_json::from_value(json!({ "port": "", "endpoints": [] })).unwrap();
        config.apply_defaults();

        assert_eq!(config.port, "9000");
        assert_eq!(config.plugins_dir(), Path::new("plugins"));
    }
}
