//! Property graph model
//!
//! - Nodes with labels and properties
//! - Directed, typed edges
//! - In-memory storage with label, identity and vector indices
//! - The airline schema (labels, relationships, property names) and merge
//!   helpers for loading reference data

pub mod airline;
pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

pub use airline::{AirlineGraph, JourneyRecord};
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};
