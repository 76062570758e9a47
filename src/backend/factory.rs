//! Backend factory — build the configured backend variant
//!
//! `local_inference` is deliberately absent here: it requires a
//! host-supplied model and is constructed in code via
//! `LocalInferenceBackend::new`.

use crate::backend::{Backend, CloudApiBackend, LocalServerBackend, StubBackend};
use crate::config::{resolve_env_value, BackendConfig, ConfigError};

/// Create a backend from its configuration section
pub fn create_backend(config: &BackendConfig) -> Result<Backend, ConfigError> {
    match config.kind.as_str() {
        "cloud_api" => {
            let base_url = require(config.base_url.as_deref(), "base_url", &config.kind)?;
            let model = require(config.model.as_deref(), "model", &config.kind)?;
            let api_key = require(config.api_key.as_deref(), "api_key", &config.kind)?;
            let api_key = resolve_env_value(&api_key)?;
            Ok(Backend::CloudApi(CloudApiBackend::new(base_url, model, api_key)))
        }
        "local_server" => {
            let host = config
                .host
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string());
            let port = config.port.unwrap_or(11434);
            let model = require(config.model.as_deref(), "model", &config.kind)?;
            Ok(Backend::LocalServer(LocalServerBackend::new(host, port, model)))
        }
        "stub" => Ok(Backend::Stub(StubBackend::new())),
        "local_inference" => Err(ConfigError::Invalid(
            "local_inference requires a host-supplied model; construct it in code".to_string(),
        )),
        other => Err(ConfigError::Invalid(format!("unknown backend kind: {}", other))),
    }
}

fn require(value: Option<&str>, field: &str, kind: &str) -> Result<String, ConfigError> {
    value
        .map(|v| v.to_string())
        .ok_or_else(|| ConfigError::Invalid(format!("backend '{}' requires '{}'", kind, field)))
}
