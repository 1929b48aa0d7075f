//! Manager for multiple vector indices
//!
//! One index per (label, embedding property), e.g. `(Journey, minilm)`.

use crate::graph::NodeId;
use crate::vector::index::{VectorIndex, VectorResult};
use std::collections::HashMap;

/// Key for identifying a vector index: (Label, PropertyKey)
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IndexKey {
    pub label: String,
    pub property_key: String,
}

impl IndexKey {
    pub fn new(label: &str, property_key: &str) -> Self {
        Self {
            label: label.to_string(),
            property_key: property_key.to_string(),
        }
    }
}

/// Manager for all vector indices of a graph store
#[derive(Debug, Default)]
pub struct VectorIndexManager {
    indices: HashMap<IndexKey, VectorIndex>,
}

impl VectorIndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index, replacing any existing index with the same key
    pub fn create_index(&mut self, label: &str, property_key: &str, dimensions: usize) {
        self.indices
            .insert(IndexKey::new(label, property_key), VectorIndex::new(dimensions));
    }

    pub fn get_index(&self, label: &str, property_key: &str) -> Option<&VectorIndex> {
        self.indices.get(&IndexKey::new(label, property_key))
    }

    /// Add a vector to an index; a no-op when no such index exists
    pub fn add_vector(
        &mut self,
        label: &str,
        property_key: &str,
        node_id: NodeId,
        vector: &Vec<f32>,
    ) -> VectorResult<()> {
        if let Some(index) = self.indices.get_mut(&IndexKey::new(label, property_key)) {
            index.add(node_id, vector)?;
        }
        Ok(())
    }

    /// Search an index. `None` when the index does not exist.
    pub fn search(
        &self,
        label: &str,
        property_key: &str,
        query: &[f32],
        k: usize,
    ) -> Option<VectorResult<Vec<(NodeId, f32)>>> {
        self.get_index(label, property_key)
            .map(|index| index.search(query, k))
    }

    pub fn list_indices(&self) -> Vec<IndexKey> {
        self.indices.keys().cloned().collect()
    }
}
