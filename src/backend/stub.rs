//! Stub backend — scripted chunks without network or model execution
//!
//! Used by integration tests and by hosts running without any configured
//! backend. Supports mid-stream error injection to exercise the
//! interrupted-stream path.

use crate::backend::{BackendError, GenerationBackend};
use crate::types::{ChatTurn, ChunkStyle, StreamChunk};

/// Scripted backend
#[derive(Debug, Clone)]
pub struct StubBackend {
    chunks: Vec<StreamChunk>,
    full_text: String,
    fail_after: Option<usize>,
}

impl StubBackend {
    /// Stream `text` as fixed-size delta chunks
    pub fn with_text(text: &str) -> Self {
        let chunk_size = 8;
        let chars: Vec<char> = text.chars().collect();
        let mut chunks: Vec<StreamChunk> = chars
            .chunks(chunk_size)
            .map(|piece| StreamChunk::delta(piece.iter().collect::<String>()))
            .collect();
        if let Some(last) = chunks.last_mut() {
            last.is_final = true;
        } else {
            chunks.push(StreamChunk::delta("").finishing());
        }
        Self {
            chunks,
            full_text: text.to_string(),
            fail_after: None,
        }
    }

    /// Stream an explicit chunk sequence
    ///
    /// The full text is derived by replaying the sequence (deltas append,
    /// cumulative payloads replace).
    pub fn with_chunks(chunks: Vec<StreamChunk>) -> Self {
        let mut full_text = String::new();
        for chunk in &chunks {
            match chunk.style {
                ChunkStyle::Delta => full_text.push_str(&chunk.payload),
                ChunkStyle::Cumulative => full_text = chunk.payload.clone(),
            }
        }
        Self {
            chunks,
            full_text,
            fail_after: None,
        }
    }

    /// Break the stream after `count` delivered chunks
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Default canned reply
    pub fn new() -> Self {
        Self::with_text("Hello! How can I help you today?")
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationBackend for StubBackend {
    fn complete(&self, _history: &[ChatTurn]) -> Result<String, BackendError> {
        if self.fail_after.is_some() {
            return Err(BackendError::Generation(
                "scripted completion failure".to_string(),
            ));
        }
        Ok(self.full_text.clone())
    }

    fn stream<F>(&self, _history: &[ChatTurn], mut on_chunk: F) -> Result<String, BackendError>
    where
        F: FnMut(StreamChunk),
    {
        let mut delivered = 0usize;
        for chunk in &self.chunks {
            if self.fail_after == Some(delivered) {
                return Err(BackendError::StreamInterrupted {
                    delivered,
                    reason: "scripted stream failure".to_string(),
                });
            }
            on_chunk(chunk.clone());
            delivered += 1;
        }
        if self.fail_after == Some(delivered) {
            return Err(BackendError::StreamInterrupted {
                delivered,
                reason: "scripted stream failure".to_string(),
            });
        }
        Ok(self.full_text.clone())
    }

    fn backend_name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_text_marks_last_chunk_final() {
        let stub = StubBackend::with_text("Hello, streaming world!");
        let mut chunks = Vec::new();
        let full = stub.stream(&[], |c| chunks.push(c)).unwrap();
        assert_eq!(full, "Hello, streaming world!");
        assert!(chunks.last().unwrap().is_final);
        assert!(chunks.iter().rev().skip(1).all(|c| !c.is_final));
        let rebuilt: String = chunks.iter().map(|c| c.payload.as_str()).collect();
        assert_eq!(rebuilt, full);
    }

    #[test]
    fn test_with_chunks_derives_full_text() {
        let stub = StubBackend::with_chunks(vec![
            StreamChunk::cumulative("Hi"),
            StreamChunk::cumulative("Hi there!").finishing(),
        ]);
        assert_eq!(stub.complete(&[]).unwrap(), "Hi there!");
    }

    #[test]
    fn test_failing_after_interrupts_stream() {
        let stub = StubBackend::with_chunks(vec![
            StreamChunk::delta("a"),
            StreamChunk::delta("b"),
            StreamChunk::delta("c"),
            StreamChunk::delta("d"),
            StreamChunk::delta("e").finishing(),
        ])
        .failing_after(3);

        let mut chunks = Vec::new();
        let result = stub.stream(&[], |c| chunks.push(c));
        assert_eq!(chunks.len(), 3);
        assert!(matches!(
            result,
            Err(BackendError::StreamInterrupted { delivered: 3, .. })
        ));
    }

    #[test]
    fn test_empty_text_still_emits_final_chunk() {
        let stub = StubBackend::with_text("");
        let mut chunks = Vec::new();
        stub.stream(&[], |c| chunks.push(c)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_final);
    }
}
