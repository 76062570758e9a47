//! Stream assembler integration tests
//!
//! Drives the assembler with chunk sequences shaped like the real
//! backends produce them:
//! - SSE-style true deltas (cloud API)
//! - full-text snapshots replayed per step (in-process inference)
//! - mixed sequences, replays, and tool-mode suppression

use mimir::{ChatTurn, StreamAssembler, StreamChunk, TurnState};

fn assemble(chunks: &[StreamChunk]) -> ChatTurn {
    let mut assembler = StreamAssembler::new(false);
    let mut turn = ChatTurn::assistant_pending();
    for chunk in chunks {
        assembler.apply_chunk(&mut turn, chunk);
    }
    turn
}

#[test]
fn test_snapshot_sequence_reduces_to_deltas() {
    // Engine snapshots: "Hi", "Hi there", "Hi there!" must append as
    // "Hi", " there", "!" with nothing re-emitted.
    let turn = assemble(&[
        StreamChunk::cumulative("Hi"),
        StreamChunk::cumulative("Hi there"),
        StreamChunk::cumulative("Hi there!").finishing(),
    ]);
    assert_eq!(turn.content, "Hi there!");
    assert_eq!(turn.state, TurnState::Finalized);
}

#[test]
fn test_delta_sequence_concatenates() {
    let turn = assemble(&[
        StreamChunk::delta("The"),
        StreamChunk::delta(" answer"),
        StreamChunk::delta(" is 4."),
        StreamChunk::delta("").finishing(),
    ]);
    assert_eq!(turn.content, "The answer is 4.");
    assert_eq!(turn.state, TurnState::Finalized);
}

#[test]
fn test_content_grows_monotonically() {
    let chunks = [
        StreamChunk::cumulative("On"),
        StreamChunk::cumulative("Once"),
        StreamChunk::cumulative("Once"),
        StreamChunk::cumulative("Once upon"),
        StreamChunk::cumulative("Once upon a time").finishing(),
    ];
    let mut assembler = StreamAssembler::new(false);
    let mut turn = ChatTurn::assistant_pending();
    let mut previous = String::new();
    for chunk in &chunks {
        assembler.apply_chunk(&mut turn, chunk);
        assert!(
            turn.content.starts_with(&previous),
            "content shrank or rewrote: '{}' after '{}'",
            turn.content,
            previous
        );
        previous = turn.content.clone();
    }
    assert_eq!(turn.content, "Once upon a time");
}

#[test]
fn test_mixed_delta_and_cumulative_sequence() {
    let turn = assemble(&[
        StreamChunk::delta("He"),
        StreamChunk::cumulative("Hell"),
        StreamChunk::cumulative("Hello wor"),
        StreamChunk::delta("ld"),
        StreamChunk::cumulative("Hello world!").finishing(),
    ]);
    assert_eq!(turn.content, "Hello world!");
}

#[test]
fn test_lifecycle_pending_streaming_finalized() {
    let mut assembler = StreamAssembler::new(false);
    let mut turn = ChatTurn::assistant_pending();
    assert_eq!(turn.state, TurnState::Pending);

    assembler.apply_chunk(&mut turn, &StreamChunk::delta("Hi"));
    assert_eq!(turn.state, TurnState::Streaming);

    assembler.apply_chunk(&mut turn, &StreamChunk::delta("!").finishing());
    assert_eq!(turn.state, TurnState::Finalized);
    assert!(turn.is_terminal());
}

#[test]
fn test_tool_mode_ignores_stream_and_resolves_wholesale() {
    let mut assembler = StreamAssembler::new(true);
    let mut turn = ChatTurn::assistant_pending();

    assembler.apply_chunk(&mut turn, &StreamChunk::delta("").with_tool_call("fetch_reminders"));
    assembler.apply_chunk(&mut turn, &StreamChunk::delta("{\"partial\":"));
    assembler.apply_chunk(&mut turn, &StreamChunk::cumulative("{\"partial\":\"args\"}"));

    assert!(turn.content.is_empty());
    assert_eq!(turn.state, TurnState::Pending);
    assert_eq!(turn.tool_call_name.as_deref(), Some("fetch_reminders"));

    assembler.resolve_tool_content(&mut turn, "You have 2 reminders today.");
    assembler.resolve_tool_content(&mut turn, "second write must not land");
    assembler.finalize(&mut turn);

    assert_eq!(turn.content, "You have 2 reminders today.");
    assert_eq!(turn.state, TurnState::Finalized);
}

#[test]
fn test_errored_turn_keeps_partial_content() {
    let mut assembler = StreamAssembler::new(false);
    let mut turn = ChatTurn::assistant_pending();
    assembler.apply_chunk(&mut turn, &StreamChunk::delta("partial "));
    assembler.apply_chunk(&mut turn, &StreamChunk::delta("answer"));
    assembler.fail(&mut turn);
    assert_eq!(turn.state, TurnState::Errored);
    assert!(turn.is_terminal());
    assert_eq!(turn.content, "partial answer");
}
