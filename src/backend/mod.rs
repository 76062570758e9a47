//! Generation backends
//!
//! Uniform adapter contract over three heterogeneous backends: a cloud
//! HTTP API, a locally-hosted inference engine, and a co-located server
//! process. Every variant produces either one complete response or a
//! finite chunk sequence whose final chunk carries `is_final = true`.

pub mod cloud_api;
pub mod factory;
pub mod local_inference;
pub mod local_server;
pub mod stub;
pub mod transport;
pub mod transport_fake;
pub mod transport_ureq;

pub use cloud_api::CloudApiBackend;
pub use factory::create_backend;
pub use local_inference::{InProcessModel, LocalInferenceBackend, ScriptedModel};
pub use local_server::LocalServerBackend;
pub use stub::StubBackend;
pub use transport::{SyncTransport, Transport};
pub use transport_fake::FakeTransport;
pub use transport_ureq::UreqTransport;

use crate::types::{ChatTurn, StreamChunk};

/// Backend errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached (connection refused, timeout, ...)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but generation failed (HTTP error, bad payload)
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The stream broke mid-flight; deltas up to `delivered` were applied
    #[error("Stream interrupted after {delivered} chunk(s): {reason}")]
    StreamInterrupted { delivered: usize, reason: String },
}

impl From<ureq::Error> for BackendError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _response) => {
                BackendError::Generation(format!("HTTP {}", code))
            }
            ureq::Error::Transport(err) => BackendError::Unavailable(err.to_string()),
        }
    }
}

/// Uniform backend contract
///
/// Generic streaming callbacks keep this trait out of `dyn` territory;
/// the concrete `Backend` enum below restores a single dispatch point.
pub trait GenerationBackend: Send + Sync {
    /// Produce one complete response for `history`, blocking
    fn complete(&self, history: &[ChatTurn]) -> Result<String, BackendError>;

    /// Stream a response for `history`, invoking `on_chunk` per chunk
    ///
    /// The sequence is finite and not restartable (a new call starts a new
    /// generation run). The final chunk has `is_final = true`, and the
    /// concatenation of normalized deltas equals the returned full text.
    fn stream<F>(&self, history: &[ChatTurn], on_chunk: F) -> Result<String, BackendError>
    where
        F: FnMut(StreamChunk);

    /// Human-readable identity for logging; no behavior depends on it
    fn backend_name(&self) -> &str;
}

/// Concrete backend adapter (tagged variant, single dispatch point)
///
/// Switching the active variant resets conversation history — the three
/// backends cannot share incompatible internal context representations.
/// That reset is the orchestrator's job; this enum is stateless between
/// calls.
#[derive(Debug)]
pub enum Backend {
    CloudApi(CloudApiBackend),
    LocalServer(LocalServerBackend),
    LocalInference(LocalInferenceBackend),
    Stub(StubBackend),
}

impl GenerationBackend for Backend {
    fn complete(&self, history: &[ChatTurn]) -> Result<String, BackendError> {
        match self {
            Backend::CloudApi(b) => b.complete(history),
            Backend::LocalServer(b) => b.complete(history),
            Backend::LocalInference(b) => b.complete(history),
            Backend::Stub(b) => b.complete(history),
        }
    }

    fn stream<F>(&self, history: &[ChatTurn], on_chunk: F) -> Result<String, BackendError>
    where
        F: FnMut(StreamChunk),
    {
        match self {
            Backend::CloudApi(b) => b.stream(history, on_chunk),
            Backend::LocalServer(b) => b.stream(history, on_chunk),
            Backend::LocalInference(b) => b.stream(history, on_chunk),
            Backend::Stub(b) => b.stream(history, on_chunk),
        }
    }

    fn backend_name(&self) -> &str {
        match self {
            Backend::CloudApi(b) => b.backend_name(),
            Backend::LocalServer(b) => b.backend_name(),
            Backend::LocalInference(b) => b.backend_name(),
            Backend::Stub(b) => b.backend_name(),
        }
    }
}

/// Serialize history as a role/content message array for the HTTP backends
pub(crate) fn history_messages(history: &[ChatTurn]) -> Vec<serde_json::Value> {
    history
        .iter()
        .map(|turn| {
            serde_json::json!({
                "role": turn.participant.role_str(),
                "content": turn.content,
            })
        })
        .collect()
}
