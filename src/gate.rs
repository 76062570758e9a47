//! Intent gate — decides whether a message should trigger a tool
//!
//! Compares the embedded message against each tool's cached prototype
//! vector. The gate fails closed: a missing prototype or a failed
//! embedding means "no trigger", never an error surfaced to the caller.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::embedding::cosine;
use crate::exemplars::ExemplarStore;

/// Default similarity threshold for tool triggering
///
/// A single global threshold shared across all tools. Per-tool tuning is a
/// deliberate non-feature until observed behavior demands it.
pub const DEFAULT_TRIGGER_THRESHOLD: f64 = 0.75;

/// Semantic tool-trigger gate over an exemplar store
#[derive(Debug)]
pub struct IntentGate {
    store: Arc<ExemplarStore>,
    threshold: f64,
}

impl IntentGate {
    /// Create a gate with the default threshold
    pub fn new(store: Arc<ExemplarStore>) -> Self {
        Self::with_threshold(store, DEFAULT_TRIGGER_THRESHOLD)
    }

    /// Create a gate with a custom threshold
    pub fn with_threshold(store: Arc<ExemplarStore>, threshold: f64) -> Self {
        Self { store, threshold }
    }

    /// The configured trigger threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The exemplar store backing this gate
    pub fn store(&self) -> &Arc<ExemplarStore> {
        &self.store
    }

    /// Should `message` trigger the tool registered as `tool_id`?
    ///
    /// True iff `cosine(embed(message), prototype(tool_id)) >= threshold`.
    /// Fails closed (false) when no prototype exists for `tool_id` or when
    /// the embedding function fails.
    pub fn should_trigger(&self, message: &str, tool_id: &str) -> bool {
        let Some(vector) = self.message_vector(message) else {
            return false;
        };
        self.triggers(&vector, tool_id, message)
    }

    /// Should `message` trigger any registered tool?
    ///
    /// Pure disjunction over the registered tools; short-circuits on the
    /// first match. The result is independent of evaluation order.
    pub fn should_trigger_any(&self, message: &str) -> bool {
        self.triggered_tool(message).is_some()
    }

    /// The first registered tool (registration order) that `message` triggers
    ///
    /// The orchestrator uses the winning tool id to invoke the executor.
    pub fn triggered_tool(&self, message: &str) -> Option<String> {
        let vector = self.message_vector(message)?;
        // Message is embedded once, then compared against each prototype.
        for tool_id in self.store.tool_ids() {
            if self.triggers(&vector, tool_id, message) {
                return Some(tool_id.to_string());
            }
        }
        None
    }

    /// Embed the message, failing closed on embedder errors
    fn message_vector(&self, message: &str) -> Option<Vec<f64>> {
        match self.store.embedder().embed(message) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(error = %e, "embedding failed, gate fails closed");
                None
            }
        }
    }

    fn triggers(&self, message_vector: &[f64], tool_id: &str, message: &str) -> bool {
        let prototype = match self.store.prototype(tool_id) {
            Ok(p) => p,
            Err(e) => {
                debug!(tool = %tool_id, error = %e, "no usable prototype, gate fails closed");
                return false;
            }
        };
        let similarity = cosine(message_vector, &prototype);
        let triggered = similarity >= self.threshold;
        debug!(
            tool = %tool_id,
            similarity,
            threshold = self.threshold,
            triggered,
            message_len = message.len(),
            "gate decision"
        );
        triggered
    }
}
