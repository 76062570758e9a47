//! Core conversation types — turns, lifecycle states, stream chunks
//!
//! Pure data structures shared across the gate, backends, assembler, and
//! orchestrator. No IO, no side effects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn (universal subset across backends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Participant {
    /// System message (sets behavior/context)
    System,
    /// User message (human input)
    User,
    /// Assistant message (generated reply)
    Assistant,
}

impl Participant {
    /// Wire-format role string used by the HTTP backends
    pub fn role_str(&self) -> &'static str {
        match self {
            Participant::System => "system",
            Participant::User => "user",
            Participant::Assistant => "assistant",
        }
    }
}

/// Turn lifecycle state
///
/// `Created` is the state of host-constructed turns (`ChatTurn::new`)
/// before they enter a conversation; the orchestrator appends user turns
/// already `Finalized` (their content is complete at construction) and
/// assistant turns as `Pending`. A pending turn moves to `Streaming` on
/// the first applied chunk and ends `Finalized`. `Errored` turns are
/// removed from history by the orchestrator rather than retained in a
/// terminal-but-visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    Created,
    Pending,
    Streaming,
    Finalized,
    Errored,
}

/// One message within a conversation's ordered history
///
/// Owned exclusively by the orchestrator's history. Mutated only by the
/// orchestrator and the stream assembler, never by a backend directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Unique turn identifier
    pub id: Uuid,
    /// Who produced this turn
    pub participant: Participant,
    /// Text buffer; grows monotonically while streaming
    pub content: String,
    /// Name of the tool invoked for this turn, if any
    pub tool_call_name: Option<String>,
    /// Lifecycle state
    pub state: TurnState,
}

impl ChatTurn {
    /// Create an empty turn in `Created` state
    pub fn new(participant: Participant) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant,
            content: String::new(),
            tool_call_name: None,
            state: TurnState::Created,
        }
    }

    /// Create a completed user turn
    ///
    /// User turns carry their full content at construction, so they skip
    /// the streaming lifecycle and are appended already finalized.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant: Participant::User,
            content: content.into(),
            tool_call_name: None,
            state: TurnState::Finalized,
        }
    }

    /// Create an assistant turn awaiting generation
    pub fn assistant_pending() -> Self {
        Self {
            id: Uuid::new_v4(),
            participant: Participant::Assistant,
            content: String::new(),
            tool_call_name: None,
            state: TurnState::Pending,
        }
    }

    /// Check if this turn has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TurnState::Finalized | TurnState::Errored)
    }
}

/// How a backend reports partial output
///
/// Both styles must be supported; the assembler normalizes them into deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkStyle {
    /// Payload is new text only
    Delta,
    /// Payload is the full text generated so far (replayed each callback)
    Cumulative,
}

/// One unit of partial output from a streaming backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Chunk text; interpretation depends on `style`
    pub payload: String,
    /// True on the last chunk of a stream (guaranteed by every backend)
    pub is_final: bool,
    /// Tool call name carried by this chunk, if the backend surfaced one
    pub tool_call_name: Option<String>,
    /// Delivery style of this chunk
    pub style: ChunkStyle,
}

impl StreamChunk {
    /// New-text-only chunk
    pub fn delta(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            is_final: false,
            tool_call_name: None,
            style: ChunkStyle::Delta,
        }
    }

    /// Full-text-so-far chunk
    pub fn cumulative(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            is_final: false,
            tool_call_name: None,
            style: ChunkStyle::Cumulative,
        }
    }

    /// Mark this chunk as the final one of its stream
    pub fn finishing(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Attach a tool call name to this chunk
    pub fn with_tool_call(mut self, name: impl Into<String>) -> Self {
        self.tool_call_name = Some(name.into());
        self
    }
}
