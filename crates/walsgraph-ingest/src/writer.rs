//! Batched writes of language nodes into a `GraphStore`.

use walsgraph_storage::{GraphStore, LanguageNode, StoreError};

/// Per-node outcome of one batch write.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    /// `(node id, error)` for every failed node
    pub errors: Vec<(String, StoreError)>,
}

/// Thin writer over a store: delete-all plus keyed batch upserts.
pub struct GraphWriter<S> {
    store: S,
}

impl<S: GraphStore> GraphWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Remove every node. Destructive and unconditional.
    pub fn clear_all(&self) -> Result<usize, StoreError> {
        self.store.clear_all()
    }

    /// Upsert a batch keyed by node `id`.
    ///
    /// A node the store refuses is counted in `failed` and the rest of the
    /// batch is still written. `Err` means the batch as a whole did not reach
    /// the store.
    pub fn upsert_batch(&self, nodes: &[LanguageNode]) -> Result<BatchResult, StoreError> {
        let outcomes = self.store.upsert_nodes(nodes)?;
        let mut result = BatchResult::default();
        for (node, outcome) in nodes.iter().zip(outcomes) {
            match outcome {
                Ok(()) => result.succeeded += 1,
                Err(err) => {
                    result.failed += 1;
                    result.errors.push((node.id.clone(), err));
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walsgraph_storage::SnapshotStore;

    #[test]
    fn partial_failures_are_collected_not_raised() {
        let writer = GraphWriter::new(SnapshotStore::in_memory());
        let nodes = vec![
            LanguageNode::new("Basque"),
            LanguageNode::new(""),
            LanguageNode::new("Spanish"),
        ];
        let result = writer.upsert_batch(&nodes).unwrap();
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.errors[0].0, "");
    }

    #[test]
    fn rewriting_the_same_batch_is_idempotent() {
        let writer = GraphWriter::new(SnapshotStore::in_memory());
        let nodes = vec![LanguageNode::new("Basque"), LanguageNode::new("Spanish")];
        writer.upsert_batch(&nodes).unwrap();
        writer.upsert_batch(&nodes).unwrap();
        assert_eq!(writer.store().node_count().unwrap(), 2);

        assert_eq!(writer.clear_all().unwrap(), 2);
        assert_eq!(writer.store().node_count().unwrap(), 0);
    }
}
