//! Configuration — exemplar sets, gate threshold, backend selection
//!
//! Loaded once at startup from TOML and validated before anything is
//! built. Configuration errors are fatal; nothing in this crate retries
//! or hot-reloads configuration.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embedding::EmbeddingFunction;
use crate::exemplars::{ExemplarError, ExemplarStore};
use crate::gate::DEFAULT_TRIGGER_THRESHOLD;

/// Configuration errors (fatal at startup)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Exemplars(#[from] ExemplarError),
}

/// One tool's exemplar phrases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExemplars {
    /// Tool identifier forwarded to the executor
    pub id: String,
    /// Ordered exemplar phrases (at least one non-blank)
    pub phrases: Vec<String>,
}

/// Backend selection and connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// `cloud_api`, `local_server`, or `stub`
    ///
    /// `local_inference` cannot be configured from a file; it needs a
    /// host-supplied model and is wired up in code.
    pub kind: String,
    /// Cloud API base URL
    pub base_url: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// API key; `env:VAR` reads from the environment
    pub api_key: Option<String>,
    /// Local server host
    pub host: Option<String>,
    /// Local server port
    pub port: Option<u16>,
}

/// Top-level orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Global tool-trigger similarity threshold, shared across all tools
    #[serde(default = "default_threshold")]
    pub trigger_threshold: f64,

    /// Initially selected backend, if configured
    #[serde(default)]
    pub backend: Option<BackendConfig>,

    /// Exemplar sets, in evaluation order
    #[serde(default)]
    pub tools: Vec<ToolExemplars>,
}

fn default_threshold() -> f64 {
    DEFAULT_TRIGGER_THRESHOLD
}

impl OrchestratorConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            tools = config.tools.len(),
            threshold = config.trigger_threshold,
            "loaded orchestrator config"
        );
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.trigger_threshold) {
            return Err(ConfigError::Invalid(format!(
                "trigger_threshold must be within [0, 1], got {}",
                self.trigger_threshold
            )));
        }
        for tool in &self.tools {
            if tool.id.trim().is_empty() {
                return Err(ConfigError::Invalid("tool id must not be blank".to_string()));
            }
            if tool.phrases.iter().all(|p| p.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "tool '{}' has no usable exemplar phrases",
                    tool.id
                )));
            }
        }
        Ok(())
    }

    /// Build an exemplar store from the configured tools
    ///
    /// Registration follows the configured order, which becomes the gate's
    /// evaluation order.
    pub fn exemplar_store(
        &self,
        embedder: Arc<dyn EmbeddingFunction>,
    ) -> Result<ExemplarStore, ConfigError> {
        let mut store = ExemplarStore::new(embedder);
        for tool in &self.tools {
            store.register(tool.id.clone(), tool.phrases.clone())?;
        }
        Ok(store)
    }
}

/// Resolve an `env:VAR` reference, passing plain values through
pub(crate) fn resolve_env_value(value: &str) -> Result<String, ConfigError> {
    if let Some(var) = value.strip_prefix("env:") {
        std::env::var(var)
            .map_err(|_| ConfigError::Invalid(format!("environment variable '{}' not set", var)))
    } else {
        Ok(value.to_string())
    }
}
