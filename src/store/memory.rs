//! In-memory implementation of [`GraphStore`].
//!
//! Nodes and edges live in an arena keyed by stable identifiers, with
//! adjacency kept as explicit edge-id lists per node. Splicing a chain is
//! therefore index reassignment, never pointer surgery.
//!
//! The whole arena sits behind one `tokio::sync::RwLock`: writes within one
//! process are serialized and reads observe a consistent snapshot at method
//! granularity. Mutations apply eagerly, so [`commit`](GraphStore::commit)
//! is a checkpoint no-op here; real transactional backends do their work
//! there instead.

use crate::error::StoreError;
use crate::store::models::{Direction, EdgeId, EdgeLabel, EdgeRecord, NodeId};
use crate::store::traits::GraphStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

#[derive(Debug, Default)]
struct NodeRecord {
    props: HashMap<String, Value>,
    outgoing: Vec<EdgeId>,
    incoming: Vec<EdgeId>,
}

#[derive(Debug)]
struct StoredEdge {
    label: EdgeLabel,
    from: NodeId,
    to: NodeId,
    props: HashMap<String, Value>,
}

#[derive(Debug, Default)]
struct Arena {
    nodes: HashMap<NodeId, NodeRecord>,
    edges: HashMap<EdgeId, StoredEdge>,
    next_edge_id: u64,
}

impl Arena {
    fn detach_edge(&mut self, id: EdgeId) -> Option<StoredEdge> {
        let edge = self.edges.remove(&id)?;
        if let Some(from) = self.nodes.get_mut(&edge.from) {
            from.outgoing.retain(|e| *e != id);
        }
        if let Some(to) = self.nodes.get_mut(&edge.to) {
            to.incoming.retain(|e| *e != id);
        }
        Some(edge)
    }
}

/// Arena-backed in-memory graph store.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    inner: RwLock<Arena>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total node count, for tests and diagnostics.
    pub async fn node_count(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    /// Total edge count, for tests and diagnostics.
    pub async fn edge_count(&self) -> usize {
        self.inner.read().await.edges.len()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn create_node(&self, id: &NodeId) -> Result<(), StoreError> {
        let mut arena = self.inner.write().await;
        if arena.nodes.contains_key(id) {
            return Err(StoreError::NodeExists(id.to_string()));
        }
        arena.nodes.insert(id.clone(), NodeRecord::default());
        trace!(node = %id, "node created");
        Ok(())
    }

    async fn node_exists(&self, id: &NodeId) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.nodes.contains_key(id))
    }

    async fn remove_node(&self, id: &NodeId) -> Result<(), StoreError> {
        let mut arena = self.inner.write().await;
        let record = arena
            .nodes
            .remove(id)
            .ok_or_else(|| StoreError::NoSuchNode(id.to_string()))?;
        for edge_id in record.outgoing.into_iter().chain(record.incoming) {
            arena.detach_edge(edge_id);
        }
        trace!(node = %id, "node removed");
        Ok(())
    }

    async fn set_node_property(
        &self,
        id: &NodeId,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut arena = self.inner.write().await;
        let record = arena
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NoSuchNode(id.to_string()))?;
        record.props.insert(key.to_string(), value);
        Ok(())
    }

    async fn node_property(&self, id: &NodeId, key: &str) -> Result<Option<Value>, StoreError> {
        let arena = self.inner.read().await;
        Ok(arena
            .nodes
            .get(id)
            .and_then(|record| record.props.get(key))
            .cloned())
    }

    async fn add_edge(
        &self,
        label: &EdgeLabel,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<EdgeId, StoreError> {
        let mut arena = self.inner.write().await;
        if !arena.nodes.contains_key(from) {
            return Err(StoreError::NoSuchNode(from.to_string()));
        }
        if !arena.nodes.contains_key(to) {
            return Err(StoreError::NoSuchNode(to.to_string()));
        }
        let id = EdgeId::new(arena.next_edge_id);
        arena.next_edge_id += 1;
        arena.edges.insert(
            id,
            StoredEdge {
                label: label.clone(),
                from: from.clone(),
                to: to.clone(),
                props: HashMap::new(),
            },
        );
        if let Some(record) = arena.nodes.get_mut(from) {
            record.outgoing.push(id);
        }
        if let Some(record) = arena.nodes.get_mut(to) {
            record.incoming.push(id);
        }
        trace!(edge = %id, %label, %from, %to, "edge added");
        Ok(id)
    }

    async fn remove_edge(&self, id: &EdgeId) -> Result<(), StoreError> {
        let mut arena = self.inner.write().await;
        arena
            .detach_edge(*id)
            .ok_or_else(|| StoreError::NoSuchEdge(id.to_string()))?;
        trace!(edge = %id, "edge removed");
        Ok(())
    }

    async fn set_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut arena = self.inner.write().await;
        let edge = arena
            .edges
            .get_mut(id)
            .ok_or_else(|| StoreError::NoSuchEdge(id.to_string()))?;
        edge.props.insert(key.to_string(), value);
        Ok(())
    }

    async fn edge_property(&self, id: &EdgeId, key: &str) -> Result<Option<Value>, StoreError> {
        let arena = self.inner.read().await;
        Ok(arena
            .edges
            .get(id)
            .and_then(|edge| edge.props.get(key))
            .cloned())
    }

    async fn edges(
        &self,
        node: &NodeId,
        label: &EdgeLabel,
        direction: Direction,
    ) -> Result<Vec<EdgeRecord>, StoreError> {
        let arena = self.inner.read().await;
        let Some(record) = arena.nodes.get(node) else {
            return Ok(Vec::new());
        };
        let ids = match direction {
            Direction::Outgoing => &record.outgoing,
            Direction::Incoming => &record.incoming,
        };
        Ok(ids
            .iter()
            .filter_map(|id| arena.edges.get(id).map(|edge| (id, edge)))
            .filter(|(_, edge)| edge.label == *label)
            .map(|(id, edge)| EdgeRecord {
                id: *id,
                label: edge.label.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
            })
            .collect())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        // Mutations are applied eagerly under the arena lock.
        trace!("commit checkpoint");
        Ok(())
    }
}
