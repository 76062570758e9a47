//! Stream assembler — per-turn chunk normalization and lifecycle
//!
//! Reconstructs one coherent assistant reply from a backend's chunk
//! sequence. Cumulative chunks (full text so far, replayed each callback)
//! and true deltas both normalize into deltas against turn-scoped state;
//! already-delivered text is never re-emitted, and the delta is never
//! re-derived by re-decoding the whole payload history.

use tracing::{debug, warn};

use crate::types::{ChatTurn, ChunkStyle, StreamChunk, TurnState};

/// Per-turn streaming state machine
///
/// One assembler drives exactly one `ChatTurn` through one generation run.
/// Streams are not restartable; a new run needs a new assembler.
#[derive(Debug)]
pub struct StreamAssembler {
    /// Tool-trigger mode: suppress incremental content, await one
    /// wholesale resolution
    tool_mode: bool,
    /// Bytes of cumulative payload already consumed from this turn
    consumed_len: usize,
    /// Set once the tool path has replaced the content wholesale
    tool_content_resolved: bool,
}

impl StreamAssembler {
    /// Create an assembler; `tool_mode` is decided by the intent gate
    /// before the first chunk arrives
    pub fn new(tool_mode: bool) -> Self {
        Self {
            tool_mode,
            consumed_len: 0,
            tool_content_resolved: false,
        }
    }

    /// Whether this assembler is in tool-trigger mode
    pub fn tool_mode(&self) -> bool {
        self.tool_mode
    }

    /// Bytes consumed from this turn's stream so far
    pub fn consumed_len(&self) -> usize {
        self.consumed_len
    }

    /// Apply one chunk to the turn
    ///
    /// Free-generation mode: the first chunk moves the turn from
    /// `Pending` to `Streaming`; every non-empty normalized delta is
    /// appended in arrival order; an `is_final` chunk finalizes the turn.
    ///
    /// Tool-trigger mode: content mutation is suppressed (partial
    /// tool-path payloads are ignored, not appended) and the turn stays
    /// `Pending` until `resolve_tool_content`; a tool call name on any
    /// chunk is recorded immediately.
    pub fn apply_chunk(&mut self, turn: &mut ChatTurn, chunk: &StreamChunk) {
        if let Some(name) = &chunk.tool_call_name {
            if turn.tool_call_name.is_none() {
                debug!(tool = %name, turn = %turn.id, "recorded tool call name");
                turn.tool_call_name = Some(name.clone());
            }
        }

        let delta = self.normalize(chunk);

        if !self.tool_mode {
            if turn.state == TurnState::Pending {
                turn.state = TurnState::Streaming;
            }
            if !delta.is_empty() {
                turn.content.push_str(&delta);
            }
            if chunk.is_final {
                self.finalize(turn);
            }
        }
    }

    /// Normalize one chunk into new text only
    ///
    /// Delta chunks pass through; cumulative chunks are sliced at
    /// `consumed_len`, which tracks the turn's stream position. A
    /// cumulative payload no longer than the consumed prefix contributes
    /// nothing.
    fn normalize(&mut self, chunk: &StreamChunk) -> String {
        match chunk.style {
            ChunkStyle::Delta => {
                self.consumed_len += chunk.payload.len();
                chunk.payload.clone()
            }
            ChunkStyle::Cumulative => {
                if chunk.payload.len() <= self.consumed_len {
                    return String::new();
                }
                match chunk.payload.get(self.consumed_len..) {
                    Some(tail) => {
                        let delta = tail.to_string();
                        self.consumed_len = chunk.payload.len();
                        delta
                    }
                    None => {
                        // Snapshot is not an extension of what we consumed
                        // (split inside a UTF-8 sequence); drop it rather
                        // than corrupt the buffer.
                        warn!(
                            consumed = self.consumed_len,
                            payload = chunk.payload.len(),
                            "cumulative chunk does not extend consumed prefix, dropping"
                        );
                        String::new()
                    }
                }
            }
        }
    }

    /// Replace the turn's content wholesale with the tool-resolved text
    ///
    /// Applied exactly once per turn; later calls are ignored. The turn
    /// stays in its current state; callers finalize separately.
    pub fn resolve_tool_content(&mut self, turn: &mut ChatTurn, content: impl Into<String>) {
        if self.tool_content_resolved {
            debug!(turn = %turn.id, "tool content already resolved, ignoring");
            return;
        }
        turn.content = content.into();
        self.tool_content_resolved = true;
    }

    /// Transition the turn to `Finalized`
    pub fn finalize(&mut self, turn: &mut ChatTurn) {
        turn.state = TurnState::Finalized;
    }

    /// Transition the turn to `Errored`
    ///
    /// Content already appended is preserved up to the last applied
    /// delta; the orchestrator decides whether the turn survives (it
    /// does not — errored turns are removed from history).
    pub fn fail(&mut self, turn: &mut ChatTurn) {
        turn.state = TurnState::Errored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant() -> ChatTurn {
        ChatTurn::assistant_pending()
    }

    #[test]
    fn test_delta_chunks_append_in_order() {
        let mut asm = StreamAssembler::new(false);
        let mut turn = assistant();
        asm.apply_chunk(&mut turn, &StreamChunk::delta("Hello"));
        asm.apply_chunk(&mut turn, &StreamChunk::delta(", world"));
        asm.apply_chunk(&mut turn, &StreamChunk::delta("!").finishing());
        assert_eq!(turn.content, "Hello, world!");
        assert_eq!(turn.state, TurnState::Finalized);
    }

    #[test]
    fn test_cumulative_chunks_normalize_to_deltas() {
        let mut asm = StreamAssembler::new(false);
        let mut turn = assistant();
        for payload in ["Hi", "Hi there", "Hi there!"] {
            asm.apply_chunk(&mut turn, &StreamChunk::cumulative(payload));
        }
        assert_eq!(turn.content, "Hi there!");
        assert_eq!(asm.consumed_len(), "Hi there!".len());
    }

    #[test]
    fn test_first_chunk_moves_pending_to_streaming() {
        let mut asm = StreamAssembler::new(false);
        let mut turn = assistant();
        assert_eq!(turn.state, TurnState::Pending);
        asm.apply_chunk(&mut turn, &StreamChunk::delta("x"));
        assert_eq!(turn.state, TurnState::Streaming);
    }

    #[test]
    fn test_repeated_cumulative_payload_is_not_duplicated() {
        let mut asm = StreamAssembler::new(false);
        let mut turn = assistant();
        asm.apply_chunk(&mut turn, &StreamChunk::cumulative("Hi there"));
        // Engine replays the same buffer without progress
        asm.apply_chunk(&mut turn, &StreamChunk::cumulative("Hi there"));
        asm.apply_chunk(&mut turn, &StreamChunk::cumulative("Hi there!"));
        assert_eq!(turn.content, "Hi there!");
    }

    #[test]
    fn test_shrinking_cumulative_payload_contributes_nothing() {
        let mut asm = StreamAssembler::new(false);
        let mut turn = assistant();
        asm.apply_chunk(&mut turn, &StreamChunk::cumulative("Hi there"));
        asm.apply_chunk(&mut turn, &StreamChunk::cumulative("Hi"));
        assert_eq!(turn.content, "Hi there");
    }

    #[test]
    fn test_tool_mode_suppresses_partial_content() {
        let mut asm = StreamAssembler::new(true);
        let mut turn = assistant();
        asm.apply_chunk(
            &mut turn,
            &StreamChunk::delta("").with_tool_call("fetch_reminders"),
        );
        asm.apply_chunk(&mut turn, &StreamChunk::delta("partial tool noise"));
        assert!(turn.content.is_empty());
        assert_eq!(turn.state, TurnState::Pending);
        assert_eq!(turn.tool_call_name.as_deref(), Some("fetch_reminders"));

        asm.resolve_tool_content(&mut turn, "3 reminders found");
        asm.finalize(&mut turn);
        assert_eq!(turn.content, "3 reminders found");
        assert_eq!(turn.state, TurnState::Finalized);
    }

    #[test]
    fn test_tool_content_resolved_exactly_once() {
        let mut asm = StreamAssembler::new(true);
        let mut turn = assistant();
        asm.resolve_tool_content(&mut turn, "first resolution");
        asm.resolve_tool_content(&mut turn, "second resolution");
        assert_eq!(turn.content, "first resolution");
    }

    #[test]
    fn test_first_tool_call_name_wins() {
        let mut asm = StreamAssembler::new(true);
        let mut turn = assistant();
        asm.apply_chunk(&mut turn, &StreamChunk::delta("").with_tool_call("first"));
        asm.apply_chunk(&mut turn, &StreamChunk::delta("").with_tool_call("second"));
        assert_eq!(turn.tool_call_name.as_deref(), Some("first"));
    }

    #[test]
    fn test_fail_marks_turn_errored_and_keeps_applied_deltas() {
        let mut asm = StreamAssembler::new(false);
        let mut turn = assistant();
        asm.apply_chunk(&mut turn, &StreamChunk::delta("partial "));
        asm.apply_chunk(&mut turn, &StreamChunk::delta("reply"));
        asm.fail(&mut turn);
        assert_eq!(turn.state, TurnState::Errored);
        assert_eq!(turn.content, "partial reply");
    }

    #[test]
    fn test_sum_of_delta_lengths_equals_content_length() {
        let mut asm = StreamAssembler::new(false);
        let mut turn = assistant();
        let chunks = [
            StreamChunk::delta("He"),
            StreamChunk::cumulative("Hell"),
            StreamChunk::cumulative("Hello wor"),
            StreamChunk::delta("ld"),
            StreamChunk::cumulative("Hello world!").finishing(),
        ];
        for chunk in &chunks {
            asm.apply_chunk(&mut turn, chunk);
        }
        assert_eq!(turn.content, "Hello world!");
        assert_eq!(asm.consumed_len(), turn.content.len());
    }
}
