//! Exemplar store — per-tool trigger phrases and cached prototype vectors
//!
//! Each registered tool owns an ordered list of exemplar phrases. The
//! prototype vector (the centroid of the phrase embeddings) is computed
//! lazily on first request and memoized indefinitely: for a fixed embedder
//! and exemplar set it is pure and deterministic, and the centroid is
//! invariant under permutation of the phrase list.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::embedding::{EmbeddingError, EmbeddingFunction};

/// Exemplar configuration and lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExemplarError {
    /// A tool was registered with no usable phrases (fatal at startup)
    #[error("Empty exemplar set for tool '{tool_id}'")]
    EmptyExemplarSet { tool_id: String },

    /// A tool id was registered twice (keys must be unique)
    #[error("Duplicate exemplar registration for tool '{tool_id}'")]
    DuplicateTool { tool_id: String },

    /// No exemplar set registered under this tool id
    #[error("No exemplar set registered for tool '{tool_id}'")]
    UnknownTool { tool_id: String },

    /// The embedding function failed while computing a prototype
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Per-tool exemplar phrases with a concurrent prototype cache
///
/// The cache is the only resource shared across concurrent gate
/// evaluations: a `DashMap` keyed by tool id, read-mostly, with the fill
/// on first access serialized per map shard rather than behind one global
/// lock. A failed computation is not cached, so a transient embedder
/// failure is retried on the next request.
pub struct ExemplarStore {
    embedder: Arc<dyn EmbeddingFunction>,
    /// (tool id, phrases) in registration order
    exemplars: Vec<(String, Vec<String>)>,
    cache: DashMap<String, Arc<Vec<f64>>>,
}

impl std::fmt::Debug for ExemplarStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExemplarStore")
            .field("tools", &self.exemplars.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl ExemplarStore {
    /// Create an empty store backed by `embedder`
    pub fn new(embedder: Arc<dyn EmbeddingFunction>) -> Self {
        Self {
            embedder,
            exemplars: Vec::new(),
            cache: DashMap::new(),
        }
    }

    /// Register a tool's exemplar phrases (configuration time)
    ///
    /// Rejects empty phrase lists, lists containing only blank phrases,
    /// and duplicate tool ids. Registration order is preserved and
    /// determines the gate's evaluation order.
    pub fn register(
        &mut self,
        tool_id: impl Into<String>,
        phrases: Vec<String>,
    ) -> Result<(), ExemplarError> {
        let tool_id = tool_id.into();
        if phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(ExemplarError::EmptyExemplarSet { tool_id });
        }
        if self.exemplars.iter().any(|(id, _)| *id == tool_id) {
            return Err(ExemplarError::DuplicateTool { tool_id });
        }
        debug!(tool = %tool_id, phrases = phrases.len(), "registered exemplar set");
        self.exemplars.push((tool_id, phrases));
        Ok(())
    }

    /// Registered tool ids in registration order
    pub fn tool_ids(&self) -> impl Iterator<Item = &str> {
        self.exemplars.iter().map(|(id, _)| id.as_str())
    }

    /// Exemplar phrases for a tool
    pub fn phrases(&self, tool_id: &str) -> Option<&[String]> {
        self.exemplars
            .iter()
            .find(|(id, _)| id == tool_id)
            .map(|(_, phrases)| phrases.as_slice())
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    /// True when no tool is registered
    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }

    /// The embedding function backing this store
    pub fn embedder(&self) -> &Arc<dyn EmbeddingFunction> {
        &self.embedder
    }

    /// Prototype vector for a tool (compute-once-per-key)
    ///
    /// First access embeds every phrase and caches the centroid; later
    /// calls return the cached vector without recomputation.
    pub fn prototype(&self, tool_id: &str) -> Result<Arc<Vec<f64>>, ExemplarError> {
        if let Some(hit) = self.cache.get(tool_id) {
            return Ok(hit.value().clone());
        }

        let phrases = self
            .phrases(tool_id)
            .ok_or_else(|| ExemplarError::UnknownTool {
                tool_id: tool_id.to_string(),
            })?;

        // Entry holds the shard lock for the duration of the fill, so a
        // concurrent first access for the same key observes the completed
        // value instead of computing a second, possibly different one.
        match self.cache.entry(tool_id.to_string()) {
            Entry::Occupied(hit) => Ok(hit.get().clone()),
            Entry::Vacant(slot) => {
                let prototype = Arc::new(self.centroid(phrases)?);
                debug!(tool = %tool_id, dimension = prototype.len(), "computed prototype vector");
                slot.insert(prototype.clone());
                Ok(prototype)
            }
        }
    }

    /// Average of the phrase embeddings
    ///
    /// Summation over the phrase list is commutative, so the centroid is
    /// order-independent (within floating tolerance). Blank phrases are
    /// skipped; they carry no trigger signal.
    fn centroid(&self, phrases: &[String]) -> Result<Vec<f64>, ExemplarError> {
        let dimension = self.embedder.dimension();
        let mut sum = vec![0.0; dimension];
        let mut count = 0usize;

        for phrase in phrases {
            if phrase.trim().is_empty() {
                continue;
            }
            let vector = self.embedder.embed(phrase)?;
            if vector.len() != dimension {
                return Err(ExemplarError::Embedding(EmbeddingError::Failed(format!(
                    "embedder returned {} components, expected {}",
                    vector.len(),
                    dimension
                ))));
            }
            for (slot, component) in sum.iter_mut().zip(vector.iter()) {
                *slot += component;
            }
            count += 1;
        }

        // register() guarantees at least one non-blank phrase
        let count = count.max(1) as f64;
        for slot in sum.iter_mut() {
            *slot /= count;
        }
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::BagOfWordsEmbedder;

    fn store() -> ExemplarStore {
        ExemplarStore::new(Arc::new(BagOfWordsEmbedder::new()))
    }

    #[test]
    fn test_register_rejects_empty_phrase_list() {
        let mut store = store();
        let result = store.register("fetch_reminders", vec![]);
        assert_eq!(
            result,
            Err(ExemplarError::EmptyExemplarSet {
                tool_id: "fetch_reminders".to_string()
            })
        );
    }

    #[test]
    fn test_register_rejects_all_blank_phrases() {
        let mut store = store();
        let result = store.register("fetch_reminders", vec!["  ".to_string(), String::new()]);
        assert!(matches!(
            result,
            Err(ExemplarError::EmptyExemplarSet { .. })
        ));
    }

    #[test]
    fn test_register_rejects_duplicate_tool_id() {
        let mut store = store();
        store
            .register("fetch_reminders", vec!["show reminders".to_string()])
            .unwrap();
        let result = store.register("fetch_reminders", vec!["another".to_string()]);
        assert!(matches!(result, Err(ExemplarError::DuplicateTool { .. })));
    }

    #[test]
    fn test_prototype_unknown_tool() {
        let store = store();
        let result = store.prototype("missing");
        assert!(matches!(result, Err(ExemplarError::UnknownTool { .. })));
    }

    #[test]
    fn test_prototype_is_cached() {
        let mut store = store();
        store
            .register("fetch_reminders", vec!["show me my reminders".to_string()])
            .unwrap();
        let first = store.prototype("fetch_reminders").unwrap();
        let second = store.prototype("fetch_reminders").unwrap();
        // Same Arc, not a recomputation
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_prototype_is_permutation_invariant() {
        let embedder: Arc<dyn EmbeddingFunction> = Arc::new(BagOfWordsEmbedder::new());

        let mut forward = ExemplarStore::new(embedder.clone());
        forward
            .register(
                "fetch_reminders",
                vec![
                    "Show me my reminders".to_string(),
                    "List my tasks for today".to_string(),
                    "What is on my agenda".to_string(),
                ],
            )
            .unwrap();

        let mut reversed = ExemplarStore::new(embedder);
        reversed
            .register(
                "fetch_reminders",
                vec![
                    "What is on my agenda".to_string(),
                    "List my tasks for today".to_string(),
                    "Show me my reminders".to_string(),
                ],
            )
            .unwrap();

        let a = forward.prototype("fetch_reminders").unwrap();
        let b = reversed.prototype("fetch_reminders").unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_concurrent_first_access_computes_prototype_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;

        struct CountingEmbedder {
            inner: BagOfWordsEmbedder,
            calls: AtomicUsize,
        }

        impl EmbeddingFunction for CountingEmbedder {
            fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.inner.embed(text)
            }

            fn dimension(&self) -> usize {
                self.inner.dimension()
            }
        }

        let embedder = Arc::new(CountingEmbedder {
            inner: BagOfWordsEmbedder::new(),
            calls: AtomicUsize::new(0),
        });
        let mut store = ExemplarStore::new(embedder.clone() as Arc<dyn EmbeddingFunction>);
        store
            .register(
                "fetch_reminders",
                vec![
                    "show me my reminders".to_string(),
                    "list my tasks for today".to_string(),
                ],
            )
            .unwrap();
        let store = Arc::new(store);

        // All threads hit the cold cache at once; the entry fill must run
        // the embedder exactly once per phrase.
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    store.prototype("fetch_reminders").unwrap()
                })
            })
            .collect();

        let prototypes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in prototypes.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut store = store();
        store.register("b_tool", vec!["beta".to_string()]).unwrap();
        store.register("a_tool", vec!["alpha".to_string()]).unwrap();
        let ids: Vec<&str> = store.tool_ids().collect();
        assert_eq!(ids, vec!["b_tool", "a_tool"]);
    }
}
