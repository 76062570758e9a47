//! Cloud API backend — remote generation service over SSE
//!
//! OpenAI-compatible wire format: `POST {base}/chat/completions`, streaming
//! responses as `data: {json}` lines with true per-token deltas, terminated
//! by `data: [DONE]`. Tool-call names surface on delta frames and are
//! forwarded on chunks with empty payloads.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::backend::transport::{SyncTransport, Transport};
use crate::backend::{history_messages, BackendError, GenerationBackend};
use crate::types::{ChatTurn, StreamChunk};

/// Remote HTTP generation backend (delta-style chunks)
#[derive(Debug)]
pub struct CloudApiBackend {
    base_url: String,
    model: String,
    api_key: String,
    transport: Transport,
}

impl CloudApiBackend {
    /// Create a backend against `base_url` with the default transport
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self::with_transport(base_url, model, api_key, Transport::default())
    }

    /// Create a backend with a custom transport (for testing)
    pub fn with_transport(
        base_url: String,
        model: String,
        api_key: String,
        transport: Transport,
    ) -> Self {
        Self {
            base_url,
            model,
            api_key,
            transport,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, history: &[ChatTurn], stream: bool) -> String {
        serde_json::json!({
            "model": self.model,
            "messages": history_messages(history),
            "stream": stream,
        })
        .to_string()
    }

    /// Content delta carried by one SSE data frame, if any
    fn frame_delta(frame: &JsonValue) -> Option<&str> {
        frame["choices"]
            .get(0)
            .and_then(|c| c.get("delta"))
            .and_then(|d| d.get("content"))
            .and_then(|c| c.as_str())
    }

    /// Tool call name carried by one SSE data frame, if any
    fn frame_tool_call(frame: &JsonValue) -> Option<&str> {
        frame["choices"]
            .get(0)
            .and_then(|c| c.get("delta"))
            .and_then(|d| d.get("tool_calls"))
            .and_then(|t| t.get(0))
            .and_then(|t| t.get("function"))
            .and_then(|f| f.get("name"))
            .and_then(|n| n.as_str())
    }
}

impl GenerationBackend for CloudApiBackend {
    fn complete(&self, history: &[ChatTurn]) -> Result<String, BackendError> {
        let body = self.build_request(history, false);
        let auth = format!("Bearer {}", self.api_key);
        let headers = [
            ("Authorization", auth.as_str()),
            ("Content-Type", "application/json"),
        ];

        let response = self.transport.post_json(&self.endpoint(), &headers, &body)?;
        let json: JsonValue = serde_json::from_str(&response)
            .map_err(|e| BackendError::Generation(format!("invalid response JSON: {}", e)))?;

        json["choices"]
            .get(0)
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                BackendError::Generation("missing choices[0].message.content".to_string())
            })
    }

    fn stream<F>(&self, history: &[ChatTurn], mut on_chunk: F) -> Result<String, BackendError>
    where
        F: FnMut(StreamChunk),
    {
        let body = self.build_request(history, true);
        let auth = format!("Bearer {}", self.api_key);
        let headers = [
            ("Authorization", auth.as_str()),
            ("Content-Type", "application/json"),
        ];

        let mut full_content = String::new();
        let mut tool_call: Option<String> = None;

        self.transport
            .post_stream(&self.endpoint(), &headers, &body, |line| {
                let Some(data) = line.strip_prefix("data: ") else {
                    return;
                };
                if data == "[DONE]" {
                    return;
                }
                let Ok(frame) = serde_json::from_str::<JsonValue>(data) else {
                    debug!(line, "skipping unparseable SSE frame");
                    return;
                };
                if let Some(name) = Self::frame_tool_call(&frame) {
                    tool_call = Some(name.to_string());
                    on_chunk(StreamChunk::delta("").with_tool_call(name));
                }
                if let Some(delta) = Self::frame_delta(&frame) {
                    full_content.push_str(delta);
                    on_chunk(StreamChunk::delta(delta));
                }
            })?;

        if full_content.is_empty() && tool_call.is_none() {
            // Some gateways answer streaming requests with a single
            // non-streaming body; retry the plain path once.
            debug!("empty SSE stream, falling back to non-streaming request");
            let text = self.complete(history)?;
            on_chunk(StreamChunk::delta(text.clone()).finishing());
            return Ok(text);
        }

        on_chunk(StreamChunk::delta("").finishing());
        Ok(full_content)
    }

    fn backend_name(&self) -> &str {
        "cloud_api"
    }
}
