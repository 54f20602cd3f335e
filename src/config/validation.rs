//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject declarations that could never be served (bad method, status, headers)
//! - Validate value ranges (status codes, ports)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: declarations → Result<(), Vec<ValidationError>>
//! - Runs before declarations are accepted into the store, so the compiler
//!   and request execution never see a malformed route

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::{EndpointDeclaration, ServerConfig};

/// A single semantic problem found in a declaration document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("port {0:?} is not a valid TCP port")]
    InvalidPort(String),

    #[error("endpoint #{index}: path {path:?} must start with '/'")]
    RelativePath { index: usize, path: String },

    #[error("endpoint #{index} ({path}): invalid method {method:?}")]
    InvalidMethod {
        index: usize,
        path: String,
        method: String,
    },

    #[error("endpoint #{index} ({path}): status code {code} out of range")]
    InvalidStatus { index: usize, path: String, code: u16 },

    #[error("endpoint #{index} ({path}): invalid header {name:?}")]
    InvalidHeader {
        index: usize,
        path: String,
        name: String,
    },
}

/// Validate a full server configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.port.parse::<u16>().is_err() {
        errors.push(ValidationError::InvalidPort(config.port.clone()));
    }
    collect_endpoint_errors(&config.endpoints, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a list of endpoint declarations (used for plugin bundles).
pub fn validate_endpoints(endpoints: &[EndpointDeclaration]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    collect_endpoint_errors(endpoints, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_endpoint_errors(endpoints: &[EndpointDeclaration], errors: &mut Vec<ValidationError>) {
    for (index, endpoint) in endpoints.iter().enumerate() {
        let path = endpoint.path.clone();

        if !endpoint.path.starts_with('/') {
            errors.push(ValidationError::RelativePath { index, path: path.clone() });
        }

        let method = endpoint.normalized_method();
        if method.is_empty() || Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod {
                index,
                path: path.clone(),
                method: endpoint.method.clone(),
            });
        }

        // 0 is the "unset" sentinel and falls back to 200.
        if endpoint.status_code != 0 && !(100..=999).contains(&endpoint.status_code) {
            errors.push(ValidationError::InvalidStatus {
                index,
                path: path.clone(),
                code: endpoint.status_code,
            });
        }

        for (name, value) in &endpoint.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::InvalidHeader {
                    index,
                    path: path.clone(),
                    name: name.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_config() {
        let mut config = ServerConfig::default();
        config.endpoints.push(
            EndpointDeclaration::new("get", "/api/users/{id}", 0, json!({"id": 1}))
                .with_header("X-Custom-Header", "custom-value"),
        );

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig {
            port: "not-a-port".into(),
            ..ServerConfig::default()
        };
        config.endpoints.push(EndpointDeclaration::new("GE T", "api", 42, "x"));
        config
            .endpoints
            .push(EndpointDeclaration::new("GET", "/ok", 200, "x").with_header("Bad Header", "v"));

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 5);
        assert!(matches!(errors[0], ValidationError::InvalidPort(_)));
        assert!(errors.contains(&ValidationError::RelativePath { index: 0, path: "api".into() }));
        assert!(errors.contains(&ValidationError::InvalidStatus {
            index: 0,
            path: "api".into(),
            code: 42
        }));
        assert!(errors.contains(&ValidationError::InvalidHeader {
            index: 1,
            path: "/ok".into(),
            name: "Bad Header".into()
        }));
    }

    #[test]
    fn test_empty_method_rejected() {
        let endpoints = vec![EndpointDeclaration::new("", "/a", 200, "x")];
        let errors = validate_endpoints(&endpoints).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidMethod { .. }));
    }
}
