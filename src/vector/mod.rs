//! Vector search over embedded journeys
//!
//! Approximate nearest-neighbour indices (HNSW) keyed by node label and
//! embedding property, plus the cosine helpers shared with the ranker.

pub mod index;
pub mod manager;

pub use index::{cosine_similarity, CosineDistance, VectorError, VectorIndex, VectorResult};
pub use manager::{IndexKey, VectorIndexManager};
