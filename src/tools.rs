//! Tool execution
//!
//! The orchestrator resolves a triggered tool by calling the host's
//! executor directly; tool output replaces the assistant turn's content
//! wholesale. Executors run on the conversation thread and should return
//! promptly.

use std::collections::HashMap;

use tracing::info;

/// Tool execution errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolError {
    /// The executor does not know this tool id
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The tool ran and failed
    #[error("Tool '{tool_id}' failed: {message}")]
    ExecutionFailed { tool_id: String, message: String },
}

/// Host-supplied tool executor
///
/// `arguments` carries the triggering context as JSON; the gate supplies
/// `{"message": <user text>}` and hosts with richer argument extraction
/// can pass more.
pub trait ToolExecutor: Send + Sync {
    fn execute(&self, tool_id: &str, arguments: &serde_json::Value) -> Result<String, ToolError>;
}

/// Canned executor for tests and backendless hosts
#[derive(Debug, Default)]
pub struct StubToolExecutor {
    responses: HashMap<String, String>,
    failures: HashMap<String, String>,
}

impl StubToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `tool_id` with a fixed response
    pub fn responding(mut self, tool_id: &str, response: &str) -> Self {
        self.responses.insert(tool_id.to_string(), response.to_string());
        self
    }

    /// Fail `tool_id` with a fixed message
    pub fn failing(mut self, tool_id: &str, message: &str) -> Self {
        self.failures.insert(tool_id.to_string(), message.to_string());
        self
    }
}

impl ToolExecutor for StubToolExecutor {
    fn execute(&self, tool_id: &str, _arguments: &serde_json::Value) -> Result<String, ToolError> {
        if let Some(message) = self.failures.get(tool_id) {
            return Err(ToolError::ExecutionFailed {
                tool_id: tool_id.to_string(),
                message: message.clone(),
            });
        }
        match self.responses.get(tool_id) {
            Some(response) => {
                info!(tool = tool_id, "stub tool executed");
                Ok(response.clone())
            }
            None => Err(ToolError::UnknownTool(tool_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stub_executor_responds() {
        let executor = StubToolExecutor::new().responding("fetch_reminders", "3 reminders");
        let result = executor.execute("fetch_reminders", &json!({"message": "show reminders"}));
        assert_eq!(result.unwrap(), "3 reminders");
    }

    #[test]
    fn test_stub_executor_unknown_tool() {
        let executor = StubToolExecutor::new();
        assert!(matches!(
            executor.execute("missing", &json!({})),
            Err(ToolError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_stub_executor_scripted_failure() {
        let executor = StubToolExecutor::new().failing("fetch_reminders", "calendar locked");
        let err = executor.execute("fetch_reminders", &json!({})).unwrap_err();
        assert!(format!("{}", err).contains("calendar locked"));
    }
}
