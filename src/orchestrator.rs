//! Conversation orchestrator
//!
//! Owns conversation history and runs one send at a time: gate the user
//! message, pick the tool or generation path, drive the pending assistant
//! turn through the assembler, and either commit the finalized turn or
//! roll it back. All mutation goes through `&mut self`; concurrent use is
//! the worker's job, not this type's.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::assembler::StreamAssembler;
use crate::backend::{Backend, BackendError, GenerationBackend};
use crate::events::{update_channel, TurnEvent, UpdateReceiver, UpdateSender};
use crate::gate::IntentGate;
use crate::tools::ToolExecutor;
use crate::types::{ChatTurn, StreamChunk};

/// Single-conversation orchestrator
pub struct Orchestrator {
    history: Vec<ChatTurn>,
    backend: Backend,
    gate: IntentGate,
    tools: Arc<dyn ToolExecutor>,
    updates: Option<UpdateSender>,
    last_error: Option<BackendError>,
}

impl Orchestrator {
    pub fn new(backend: Backend, gate: IntentGate, tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            history: Vec::new(),
            backend,
            gate,
            tools,
            updates: None,
            last_error: None,
        }
    }

    /// Attach a bounded update feed and return its receiving half
    ///
    /// A full feed blocks `send` until the observer drains it; dropping
    /// the receiver silently disables emission.
    pub fn update_feed(&mut self, capacity: usize) -> UpdateReceiver {
        let (tx, rx) = update_channel(capacity);
        self.updates = Some(tx);
        rx
    }

    /// Process one user message
    ///
    /// Appends the user turn (already final) and a pending assistant
    /// turn, then resolves the assistant turn through the tool path or
    /// the generation path. On success the finalized assistant turn is
    /// returned and committed to history; on failure the pending turn is
    /// removed, the error is recorded as `last_error`, and history ends
    /// at the user turn.
    ///
    /// Tool execution failures are not send failures: the assistant turn
    /// finalizes with a diagnostic message instead.
    pub fn send(&mut self, text: &str, streaming: bool) -> Result<ChatTurn, BackendError> {
        let user = ChatTurn::user(text);
        debug!(turn = %user.id, "user turn appended");
        self.history.push(user.clone());
        emit(&self.updates, TurnEvent::TurnAppended { turn: user });

        let mut turn = ChatTurn::assistant_pending();
        self.history.push(turn.clone());
        emit(&self.updates, TurnEvent::TurnAppended { turn: turn.clone() });

        let outcome = match self.gate.triggered_tool(text) {
            Some(tool_id) => self.run_tool(&mut turn, &tool_id, text),
            None => self.run_generation(&mut turn, streaming),
        };

        match outcome {
            Ok(()) => {
                if let Some(last) = self.history.last_mut() {
                    *last = turn.clone();
                }
                emit(&self.updates, TurnEvent::TurnUpdated { turn: turn.clone() });
                Ok(turn)
            }
            Err(err) => {
                warn!(error = %err, "send failed, rolling back pending turn");
                self.history.pop();
                emit(&self.updates, TurnEvent::TurnRemoved { turn_id: turn.id });
                emit(
                    &self.updates,
                    TurnEvent::ConversationFailed {
                        error: err.to_string(),
                    },
                );
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Tool path: execute directly, bypassing the backend
    fn run_tool(
        &mut self,
        turn: &mut ChatTurn,
        tool_id: &str,
        text: &str,
    ) -> Result<(), BackendError> {
        info!(tool = tool_id, "intent gate triggered tool");
        let mut assembler = StreamAssembler::new(true);
        turn.tool_call_name = Some(tool_id.to_string());

        let arguments = serde_json::json!({ "message": text });
        let content = match self.tools.execute(tool_id, &arguments) {
            Ok(output) => output,
            Err(err) => {
                warn!(tool = tool_id, error = %err, "tool execution failed");
                format!("The '{}' tool could not complete: {}", tool_id, err)
            }
        };
        assembler.resolve_tool_content(turn, content);
        assembler.finalize(turn);
        Ok(())
    }

    /// Generation path: stream or complete against the active backend
    fn run_generation(&mut self, turn: &mut ChatTurn, streaming: bool) -> Result<(), BackendError> {
        // Backend context ends at the user turn; the pending assistant
        // turn is not part of the prompt.
        let context_len = self.history.len().saturating_sub(1);
        let context = &self.history[..context_len];
        let mut assembler = StreamAssembler::new(false);

        if streaming {
            let updates = self.updates.clone();
            let full = self.backend.stream(context, |chunk| {
                assembler.apply_chunk(turn, &chunk);
                emit(&updates, TurnEvent::TurnUpdated { turn: turn.clone() });
            })?;
            // A backend that only reports the full text at the end still
            // yields a complete turn.
            if turn.content.is_empty() && !full.is_empty() {
                turn.content = full;
            }
        } else {
            let full = self.backend.complete(context)?;
            assembler.apply_chunk(turn, &StreamChunk::cumulative(full).finishing());
        }

        if !turn.is_terminal() {
            assembler.finalize(turn);
        }
        Ok(())
    }

    /// Committed history, in order
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Owned copy of the committed history
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.history.clone()
    }

    /// Error from the most recent failed send, if any
    pub fn last_error(&self) -> Option<&BackendError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Clear history and any recorded error
    pub fn reset(&mut self) {
        info!(turns = self.history.len(), "conversation reset");
        self.history.clear();
        self.last_error = None;
        emit(&self.updates, TurnEvent::HistoryCleared);
    }

    /// Replace the active backend
    ///
    /// Backends do not share context representations, so switching always
    /// resets the conversation.
    pub fn switch_backend(&mut self, backend: Backend) {
        info!(
            from = self.backend.backend_name(),
            to = backend.backend_name(),
            "switching backend"
        );
        self.backend = backend;
        self.reset();
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("history_len", &self.history.len())
            .field("backend", &self.backend.backend_name())
            .field("last_error", &self.last_error)
            .finish()
    }
}

fn emit(updates: &Option<UpdateSender>, event: TurnEvent) {
    if let Some(tx) = updates {
        // Observer gone is not an error for the conversation.
        let _ = tx.send(event);
    }
}
