//! Mimir: conversational orchestration with semantic tool triggering
//!
//! This library decides per message whether to invoke a registered tool or
//! generate a free reply, streams the reply through a normalizing
//! assembler, and keeps conversation history consistent across backend
//! failures and backend switches.

pub mod assembler;
pub mod backend;
pub mod config;
pub mod embedding;
pub mod events;
pub mod exemplars;
pub mod gate;
pub mod orchestrator;
pub mod tools;
pub mod types;
pub mod worker;

// Re-export the turn model
pub use types::{ChatTurn, ChunkStyle, Participant, StreamChunk, TurnState};

// Re-export the gate pipeline
pub use embedding::{cosine, BagOfWordsEmbedder, EmbeddingError, EmbeddingFunction};
pub use exemplars::{ExemplarError, ExemplarStore};
pub use gate::{IntentGate, DEFAULT_TRIGGER_THRESHOLD};

// Re-export backends
pub use backend::{
    create_backend, Backend, BackendError, CloudApiBackend, GenerationBackend,
    InProcessModel, LocalInferenceBackend, LocalServerBackend, StubBackend,
};

// Re-export orchestration
pub use assembler::StreamAssembler;
pub use events::{TurnEvent, UpdateReceiver, UpdateSender};
pub use orchestrator::Orchestrator;
pub use tools::{StubToolExecutor, ToolError, ToolExecutor};
pub use worker::{spawn_conversation, ConversationCommand, ConversationHandle};

// Re-export configuration
pub use config::{BackendConfig, ConfigError, OrchestratorConfig, ToolExemplars};
