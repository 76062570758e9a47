//! Conversation update feed
//!
//! Ordered turn lifecycle events for observers (a UI, a logger, a test
//! harness). Events are emitted in the order the mutations happen on the
//! conversation thread; a bounded channel applies backpressure to that
//! thread rather than reordering or coalescing.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use uuid::Uuid;

use crate::types::ChatTurn;

/// One observable conversation mutation
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// A new turn entered history (user turns arrive `Finalized`,
    /// assistant turns arrive `Pending`)
    TurnAppended { turn: ChatTurn },
    /// An existing turn changed (content grew, state advanced)
    TurnUpdated { turn: ChatTurn },
    /// A turn was rolled back out of history
    TurnRemoved { turn_id: Uuid },
    /// History was cleared (reset or backend switch)
    HistoryCleared,
    /// A send failed; the error text accompanies the rollback
    ConversationFailed { error: String },
}

/// Sending half of the update feed
pub type UpdateSender = SyncSender<TurnEvent>;
/// Receiving half of the update feed
pub type UpdateReceiver = Receiver<TurnEvent>;

/// Create a bounded update feed
///
/// A full channel blocks the conversation thread until the observer
/// drains it; a dropped receiver silently disables emission.
pub fn update_channel(capacity: usize) -> (UpdateSender, UpdateReceiver) {
    sync_channel(capacity)
}
