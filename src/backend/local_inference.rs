//! Local inference backend — in-process model execution
//!
//! Model loading, weights, and GPU configuration live with the host behind
//! the `InProcessModel` trait. Engines of this kind re-decode their whole
//! token buffer on every callback, so each snapshot carries the full text
//! generated so far — the chunks are cumulative, and the assembler
//! normalizes them into deltas.

use std::sync::Arc;

use crate::backend::{BackendError, GenerationBackend};
use crate::types::{ChatTurn, StreamChunk};

/// In-process generation engine supplied by the host
pub trait InProcessModel: Send + Sync {
    /// Decode a reply to `history`, invoking `on_snapshot` with the full
    /// text decoded so far after each step. Returns the final full text.
    fn decode(
        &self,
        history: &[ChatTurn],
        on_snapshot: &mut dyn FnMut(&str),
    ) -> Result<String, BackendError>;
}

/// In-process inference backend (cumulative-style chunks)
#[derive(Clone)]
pub struct LocalInferenceBackend {
    model: Arc<dyn InProcessModel>,
}

impl std::fmt::Debug for LocalInferenceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalInferenceBackend").finish_non_exhaustive()
    }
}

impl LocalInferenceBackend {
    /// Wrap a host-supplied engine
    pub fn new(model: Arc<dyn InProcessModel>) -> Self {
        Self { model }
    }
}

impl GenerationBackend for LocalInferenceBackend {
    fn complete(&self, history: &[ChatTurn]) -> Result<String, BackendError> {
        self.model.decode(history, &mut |_snapshot| {})
    }

    fn stream<F>(&self, history: &[ChatTurn], mut on_chunk: F) -> Result<String, BackendError>
    where
        F: FnMut(StreamChunk),
    {
        let full = self.model.decode(history, &mut |snapshot| {
            on_chunk(StreamChunk::cumulative(snapshot));
        })?;
        // Final cumulative chunk repeats the full text; normalization
        // reduces it to whatever tail the snapshots did not yet cover.
        on_chunk(StreamChunk::cumulative(full.clone()).finishing());
        Ok(full)
    }

    fn backend_name(&self) -> &str {
        "local_inference"
    }
}

/// Scripted in-process model for tests and offline hosts
///
/// Replays fixed snapshots (each the full text so far) and returns the
/// last one as the final text.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    snapshots: Vec<String>,
    error: Option<BackendError>,
}

impl ScriptedModel {
    /// Replay the given snapshots
    pub fn new(snapshots: &[&str]) -> Self {
        Self {
            snapshots: snapshots.iter().map(|s| s.to_string()).collect(),
            error: None,
        }
    }

    /// Fail with `error` after replaying all snapshots
    pub fn failing_with(snapshots: &[&str], error: BackendError) -> Self {
        Self {
            snapshots: snapshots.iter().map(|s| s.to_string()).collect(),
            error: Some(error),
        }
    }
}

impl InProcessModel for ScriptedModel {
    fn decode(
        &self,
        _history: &[ChatTurn],
        on_snapshot: &mut dyn FnMut(&str),
    ) -> Result<String, BackendError> {
        for snapshot in &self.snapshots {
            on_snapshot(snapshot);
        }
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(self.snapshots.last().cloned().unwrap_or_default())
    }
}
