//! Local server backend — co-located server process over NDJSON
//!
//! Ollama-style wire format: `POST http://{host}:{port}/api/chat`, one JSON
//! object per line with true content deltas and a `done` marker on the last
//! line.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::backend::transport::{SyncTransport, Transport};
use crate::backend::{history_messages, BackendError, GenerationBackend};
use crate::types::{ChatTurn, StreamChunk};

/// Local HTTP server backend (delta-style chunks)
#[derive(Debug)]
pub struct LocalServerBackend {
    host: String,
    port: u16,
    model: String,
    transport: Transport,
}

impl LocalServerBackend {
    /// Create a backend against `host:port` with the default transport
    pub fn new(host: String, port: u16, model: String) -> Self {
        Self::with_transport(host, port, model, Transport::default())
    }

    /// Create a backend with a custom transport (for testing)
    pub fn with_transport(host: String, port: u16, model: String, transport: Transport) -> Self {
        Self {
            host,
            port,
            model,
            transport,
        }
    }

    fn endpoint(&self) -> String {
        format!("http://{}:{}/api/chat", self.host, self.port)
    }

    fn build_request(&self, history: &[ChatTurn], stream: bool) -> String {
        serde_json::json!({
            "model": self.model,
            "messages": history_messages(history),
            "stream": stream,
        })
        .to_string()
    }

    fn line_content(line: &JsonValue) -> Option<&str> {
        line.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
    }
}

impl GenerationBackend for LocalServerBackend {
    fn complete(&self, history: &[ChatTurn]) -> Result<String, BackendError> {
        let body = self.build_request(history, false);
        let headers = [("Content-Type", "application/json")];

        let response = self.transport.post_json(&self.endpoint(), &headers, &body)?;
        let json: JsonValue = serde_json::from_str(&response)
            .map_err(|e| BackendError::Generation(format!("invalid response JSON: {}", e)))?;

        Self::line_content(&json)
            .map(|s| s.to_string())
            .ok_or_else(|| BackendError::Generation("missing message.content".to_string()))
    }

    fn stream<F>(&self, history: &[ChatTurn], mut on_chunk: F) -> Result<String, BackendError>
    where
        F: FnMut(StreamChunk),
    {
        let body = self.build_request(history, true);
        let headers = [("Content-Type", "application/json")];

        let mut full_content = String::new();

        self.transport
            .post_stream(&self.endpoint(), &headers, &body, |line| {
                if line.is_empty() {
                    return;
                }
                let Ok(json) = serde_json::from_str::<JsonValue>(line) else {
                    debug!(line, "skipping unparseable NDJSON line");
                    return;
                };
                if let Some(content) = Self::line_content(&json) {
                    if !content.is_empty() {
                        full_content.push_str(content);
                        on_chunk(StreamChunk::delta(content));
                    }
                }
            })?;

        if full_content.is_empty() {
            // Server may answer a streaming request with one plain body
            debug!("empty NDJSON stream, falling back to non-streaming request");
            let text = self.complete(history)?;
            on_chunk(StreamChunk::delta(text.clone()).finishing());
            return Ok(text);
        }

        on_chunk(StreamChunk::delta("").finishing());
        Ok(full_content)
    }

    fn backend_name(&self) -> &str {
        "local_server"
    }
}
