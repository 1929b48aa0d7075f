//! In-process accessor over a shared [`GraphStore`]

use super::{traversal, GraphAccessor, Statement, StoreResult};
use crate::evidence::Row;
use crate::graph::GraphStore;
use crate::intent::Params;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Evaluates statements natively against an in-memory graph. Each call
/// holds a read guard for the duration of one statement.
#[derive(Clone)]
pub struct MemoryAccessor {
    store: Arc<RwLock<GraphStore>>,
}

impl MemoryAccessor {
    pub fn new(store: GraphStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn from_shared(store: Arc<RwLock<GraphStore>>) -> Self {
        Self { store }
    }

    /// The underlying store, e.g. for loading data or writing embeddings
    pub fn shared(&self) -> Arc<RwLock<GraphStore>> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl GraphAccessor for MemoryAccessor {
    fn name(&self) -> &str {
        "memory"
    }

    async fn run(&self, statement: &Statement, params: &Params) -> StoreResult<Vec<Row>> {
        let graph = self.store.read().await;
        let rows = traversal::evaluate(&graph, statement, params)?;
        tracing::debug!("{} returned {} rows", statement, rows.len());
        Ok(rows)
    }
}
