//! Class graph memoization
//!
//! Many products share a pharmacologic class, and the class graph lookup is
//! read-only within a run, so each class id is fetched at most once. Entries
//! are never refreshed; absent responses are cached as well.

use crate::services::rxnav_client::RxNavError;
use crate::types::{ClassGraph, TerminologySource};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Class id → class graph response, write-once per key
#[derive(Debug, Default)]
pub struct ClassificationCache {
    graphs: HashMap<String, Option<ClassGraph>>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached class ids
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Therapeutic class name for a pharmacologic class id
    ///
    /// Fetches the class graph through `source` on first use of `class_id`.
    /// Returns `None` when the service has no graph or the graph has no
    /// parent node.
    pub async fn therapeutic_class<S>(
        &mut self,
        source: &S,
        class_id: &str,
    ) -> Result<Option<String>, RxNavError>
    where
        S: TerminologySource + ?Sized,
    {
        if !self.graphs.contains_key(class_id) {
            let graph = source.class_graph(class_id).await?;
            debug!(class_id = %class_id, found = graph.is_some(), "Cached class graph");
            self.graphs.insert(class_id.to_string(), graph);
        }

        let Some(graph) = self.graphs.get(class_id).and_then(Option::as_ref) else {
            return Ok(None);
        };

        match graph.therapeutic_class_name() {
            Some(name) => Ok(Some(name.to_string())),
            None => {
                warn!(
                    class_id = %class_id,
                    nodes = graph.concepts.len(),
                    "Class graph has no parent class"
                );
                Ok(None)
            }
        }
    }
}
