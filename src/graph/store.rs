//! In-memory graph storage implementation
//!
//! Arena storage with adjacency lists, a label index, an identity index used
//! by merge-style loading, and per (label, property) vector indices.

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, Label, NodeId};
use crate::vector::{VectorIndexManager, VectorResult};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Identity conflict on {label}: {detail}")]
    IdentityConflict { label: String, detail: String },

    #[error("Vector index error: {0}")]
    Vector(#[from] crate::vector::VectorError),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
///
/// - nodes: NodeId -> Node (arena, ids start at 1)
/// - outgoing / incoming: NodeId -> Vec<EdgeId>
/// - label_index: Label -> node ids
/// - identities: (Label, identity key) -> NodeId
#[derive(Debug)]
pub struct GraphStore {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    label_index: HashMap<Label, HashSet<NodeId>>,
    identities: HashMap<(Label, String), NodeId>,
    /// Vector indices over embedding properties
    pub vector_index: VectorIndexManager,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        GraphStore {
            // slot 0 is never used so that ids start at 1
            nodes: vec![None],
            edges: vec![None],
            outgoing: vec![Vec::new()],
            incoming: vec![Vec::new()],
            label_index: HashMap::new(),
            identities: HashMap::new(),
            vector_index: VectorIndexManager::new(),
        }
    }

    /// Create a node with labels and properties
    pub fn create_node_with_properties(&mut self, labels: Vec<Label>, properties: PropertyMap) -> NodeId {
        let node_id = NodeId::new(self.nodes.len() as u64);

        for label in &labels {
            self.label_index.entry(label.clone()).or_default().insert(node_id);
        }

        let node = Node::new_with_properties(node_id, labels, properties);
        self.index_vectors(&node);

        self.nodes.push(Some(node));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        node_id
    }

    /// Create a node with a single label and no properties
    pub fn create_node(&mut self, label: impl Into<Label>) -> NodeId {
        self.create_node_with_properties(vec![label.into()], PropertyMap::new())
    }

    /// Find-or-create a node by its identity key.
    ///
    /// The identity key is the concatenation of the identity property values;
    /// when the node already exists its properties are left untouched.
    pub fn merge_node(
        &mut self,
        label: &str,
        identity: &[(&str, PropertyValue)],
        properties: PropertyMap,
    ) -> GraphResult<NodeId> {
        if identity.iter().any(|(_, v)| v.is_null()) {
            return Err(GraphError::IdentityConflict {
                label: label.to_string(),
                detail: "identity properties must not be null".to_string(),
            });
        }
        let key = identity
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("|");
        let label = Label::new(label);
        if let Some(&existing) = self.identities.get(&(label.clone(), key.clone())) {
            return Ok(existing);
        }

        let mut props = properties;
        for (k, v) in identity {
            props.insert(k.to_string(), v.clone());
        }
        let id = self.create_node_with_properties(vec![label.clone()], props);
        self.identities.insert((label, key), id);
        Ok(id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_u64() as usize).and_then(Option::as_ref)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Set a node property, keeping vector indices in sync
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let value = value.into();
        let node = self
            .nodes
            .get_mut(id.as_u64() as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::NodeNotFound(id))?;
        let old = node.set_property(key, value.clone());

        if let PropertyValue::Vector(vec) = &value {
            let labels: Vec<Label> = node.labels.iter().cloned().collect();
            for label in labels {
                self.vector_index.add_vector(label.as_str(), key, id, vec)?;
            }
        }
        Ok(old)
    }

    /// Create a directed edge. Creating the same (source, target, type) twice
    /// returns the existing edge.
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }
        let edge_type = edge_type.into();
        if let Some(existing) = self
            .get_outgoing_edges(source)
            .into_iter()
            .find(|e| e.target == target && e.edge_type == edge_type)
        {
            return Ok(existing.id);
        }

        let edge_id = EdgeId::new(self.edges.len() as u64);
        self.edges.push(Some(Edge::new(edge_id, source, target, edge_type)));
        self.outgoing[source.as_u64() as usize].push(edge_id);
        self.incoming[target.as_u64() as usize].push(edge_id);
        Ok(edge_id)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.as_u64() as usize).and_then(Option::as_ref)
    }

    /// Get all outgoing edges from a node
    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(node_id.as_u64() as usize)
            .map(|edge_ids| edge_ids.iter().filter_map(|&id| self.get_edge(id)).collect())
            .unwrap_or_default()
    }

    /// Get all incoming edges to a node
    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.incoming
            .get(node_id.as_u64() as usize)
            .map(|edge_ids| edge_ids.iter().filter_map(|&id| self.get_edge(id)).collect())
            .unwrap_or_default()
    }

    /// Targets of outgoing edges of the given type
    pub fn out_neighbors(&self, node_id: NodeId, edge_type: &str) -> Vec<&Node> {
        self.get_outgoing_edges(node_id)
            .into_iter()
            .filter(|e| e.edge_type.as_str() == edge_type)
            .filter_map(|e| self.get_node(e.target))
            .collect()
    }

    /// Sources of incoming edges of the given type
    pub fn in_neighbors(&self, node_id: NodeId, edge_type: &str) -> Vec<&Node> {
        self.get_incoming_edges(node_id)
            .into_iter()
            .filter(|e| e.edge_type.as_str() == edge_type)
            .filter_map(|e| self.get_node(e.source))
            .collect()
    }

    /// Get all nodes with a specific label, in id order
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        let mut ids: Vec<NodeId> = self
            .label_index
            .get(label)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids.into_iter().filter_map(|id| self.get_node(id)).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Create or rebuild the vector index for a label/property pair from
    /// the vectors currently stored under that property
    pub fn create_vector_index(&mut self, label: &str, property_key: &str, dimensions: usize) -> VectorResult<()> {
        self.vector_index.create_index(label, property_key, dimensions);
        let existing: Vec<(NodeId, Vec<f32>)> = self
            .get_nodes_by_label(&Label::new(label))
            .into_iter()
            .filter_map(|n| {
                n.get_property(property_key)
                    .and_then(PropertyValue::as_vector)
                    .map(|v| (n.id, v.to_vec()))
            })
            .collect();
        for (id, vec) in existing {
            self.vector_index.add_vector(label, property_key, id, &vec)?;
        }
        Ok(())
    }

    /// Nearest neighbours through a vector index. `None` when no index
    /// exists for the label/property pair.
    pub fn vector_search(
        &self,
        label: &str,
        property_key: &str,
        query: &[f32],
        k: usize,
    ) -> Option<VectorResult<Vec<(NodeId, f32)>>> {
        self.vector_index.search(label, property_key, query, k)
    }

    fn index_vectors(&mut self, node: &Node) {
        for (key, value) in &node.properties {
            if let PropertyValue::Vector(vec) = value {
                for label in &node.labels {
                    if let Err(e) = self.vector_index.add_vector(label.as_str(), key, node.id, vec) {
                        tracing::warn!("Skipping vector {} on {}: {}", key, node.id, e);
                    }
                }
            }
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
