//! Offline edits of the configuration file (`--add-endpoint`).

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::config::loader::{save_config, ConfigError};
use crate::config::schema::{EndpointDeclaration, ResponseBody, ServerConfig};

/// Response body used by `--add-endpoint` when none is given.
pub const DEFAULT_RESPONSE: &str = r#"{"message": "Hello World"}"#;

/// Outcome of [`upsert_endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
}

/// Parse a `key1:value1,key2:value2` header list.
///
/// Pairs are split on the first `:` and trimmed; pairs without a key are dropped.
pub fn parse_headers(input: &str) -> BTreeMap<String, String> {
    input
        .split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Interpret a command-line response argument.
///
/// Valid JSON becomes a structured response (a JSON string stays raw),
/// anything else is kept as a raw string.
pub fn parse_response(input: &str) -> ResponseBody {
    match serde_json::from_str::<Value>(input) {
        Ok(value) => ResponseBody::from(value),
        Err(_) => ResponseBody::Raw(input.to_string()),
    }
}

/// Add or replace an endpoint (matched on path + method) in the config file.
///
/// A missing config file is created with default settings.
pub fn upsert_endpoint(config_path: &Path, mut endpoint: EndpointDeclaration) -> Result<Upsert, ConfigError> {
    let mut config = read_or_default(config_path)?;
    config.apply_defaults();
    endpoint.method = endpoint.normalized_method();

    let existing = config
        .endpoints
        .iter_mut()
        .find(|e| e.path == endpoint.path && e.normalized_method() == endpoint.method);

    let outcome = match existing {
        Some(slot) => {
            *slot = endpoint;
            Upsert::Updated
        }
        None => {
            config.endpoints.push(endpoint);
            Upsert::Added
        }
    };

    save_config(&config, config_path)?;
    Ok(outcome)
}

fn read_or_default(path: &Path) -> Result<ServerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config;
    use serde_json::json;

    #[test]
    fn test_parse_headers() {
        assert!(parse_headers("").is_empty());
        assert_eq!(
            parse_headers("Content-Type:application/json"),
            BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
        );

        let headers = parse_headers("Content-Type: application/json, X-Custom: value, broken");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-Custom"], "value");

        let headers = parse_headers("Location:http://example.com/next");
        assert_eq!(headers["Location"], "http://example.com/next");
    }

    #[test]
    fn test_parse_response() {
        assert_eq!(
            parse_response(r#"{"message": "test"}"#),
            ResponseBody::Structured(json!({"message": "test"}))
        );
        assert_eq!(parse_response("[1, 2, 3]"), ResponseBody::Structured(json!([1, 2, 3])));
        assert_eq!(parse_response(r#""simple string""#), ResponseBody::Raw("simple string".into()));
        assert_eq!(parse_response("plain text"), ResponseBody::Raw("plain text".into()));
    }

    #[test]
    fn test_upsert_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let endpoint = EndpointDeclaration::new("post", "/api/test", 201, json!({"test": true})).with_delay_ms(100);
        assert_eq!(upsert_endpoint(&path, endpoint).unwrap(), Upsert::Added);

        let config = load_config(&path).unwrap();
        assert_eq!(config.port, "9000");
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.endpoints[0].method, "POST");
        assert_eq!(config.endpoints[0].status_code, 201);
        assert_eq!(config.endpoints[0].delay, 100);

        let replacement = EndpointDeclaration::new("POST", "/api/test", 202, "accepted");
        assert_eq!(upsert_endpoint(&path, replacement).unwrap(), Upsert::Updated);

        let config = load_config(&path).unwrap();
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.endpoints[0].status_code, 202);
        assert_eq!(config.endpoints[0].response, ResponseBody::Raw("accepted".into()));
    }
}
