//! Vector index implementation using HNSW
//!
//! Wraps `hnsw_rs` for approximate nearest neighbour search. Distances are
//! cosine distances (`1 - cosine similarity`).

use crate::graph::NodeId;
use hnsw_rs::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Vector index errors
#[derive(Error, Debug, PartialEq)]
pub enum VectorError {
    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type VectorResult<T> = Result<T, VectorError>;

/// Cosine distance implementation for hnsw_rs
#[derive(Clone, Copy, Debug, Default)]
pub struct CosineDistance;

impl Distance<f32> for CosineDistance {
    fn eval(&self, va: &[f32], vb: &[f32]) -> f32 {
        1.0 - cosine_similarity(va, vb)
    }
}

/// Cosine similarity of two vectors.
///
/// Zero-norm inputs have similarity 0. Extra trailing components of the
/// longer vector are ignored.
pub fn cosine_similarity(va: &[f32], vb: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (a, b) in va.iter().zip(vb.iter()) {
        dot += a * b;
        norm_a += a * a;
        norm_b += b * b;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Wrapper around an HNSW index
pub struct VectorIndex {
    dimensions: usize,
    /// Node ids already inserted. HNSW has no update, so re-inserts are
    /// skipped and changed vectors need a rebuild (`GraphStore::create_vector_index`)
    members: HashSet<NodeId>,
    hnsw: Hnsw<'static, f32, CosineDistance>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("dimensions", &self.dimensions)
            .field("len", &self.members.len())
            .finish()
    }
}

impl VectorIndex {
    /// Create a new vector index
    pub fn new(dimensions: usize) -> Self {
        let max_elements = 100_000;
        let m = 16;
        let ef_construction = 200;

        let hnsw = Hnsw::new(m, max_elements, 16, ef_construction, CosineDistance);

        Self {
            dimensions,
            members: HashSet::new(),
            hnsw,
        }
    }

    /// Add a vector to the index. Returns `false` if the node was already indexed.
    pub fn add(&mut self, node_id: NodeId, vector: &Vec<f32>) -> VectorResult<bool> {
        if vector.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        if !self.members.insert(node_id) {
            return Ok(false);
        }

        self.hnsw.insert((vector, node_id.0 as usize));
        Ok(true)
    }

    /// Search for the `k` nearest neighbours, closest first
    pub fn search(&self, query: &[f32], k: usize) -> VectorResult<Vec<(NodeId, f32)>> {
        if query.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        if k == 0 || self.members.is_empty() {
            return Ok(Vec::new());
        }

        let ef_search = (k * 2).max(32);
        let mut neighbors: Vec<(NodeId, f32)> = self
            .hnsw
            .search(query, k, ef_search)
            .into_iter()
            .map(|res| (NodeId::new(res.d_id as u64), res.distance))
            .collect();
        neighbors.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        Ok(neighbors)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
