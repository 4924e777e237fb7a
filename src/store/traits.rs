//! GraphStore trait definition
//!
//! Defines the abstract interface the feed engine consumes: nodes, labeled
//! directed edges, JSON properties, and an explicit commit boundary. The
//! engine is written entirely against this trait, enabling testing with the
//! in-memory implementation and future backend swaps.
//!
//! Preconditions the engine states rather than enforces:
//!
//! - **Single writer per chain.** Concurrent writers mutating the same
//!   entity's stream chain or the same user's feed chain must be serialized
//!   by the caller or the store. The engine serializes the structurally
//!   dependent steps *within* one public operation, nothing more.
//! - **Commit is the atomicity boundary.** Each public write operation of
//!   the engine performs its full splice and then calls [`GraphStore::commit`]
//!   exactly once; a store with real transactions must make the whole
//!   operation take effect or roll back as a unit.
//!
//! The at-most-one-outgoing-edge-per-chain-label invariant is the *engine's*
//! responsibility: it treats multiple same-label outgoing edges as
//! corruption, never silently picks one.

use crate::error::StoreError;
use crate::store::models::{Direction, EdgeId, EdgeLabel, EdgeRecord, NodeId};
use async_trait::async_trait;
use serde_json::Value;

/// Abstract interface for the property graph backing the feed engine.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create a node with the given id. Fails with [`StoreError::NodeExists`]
    /// if the id is taken.
    async fn create_node(&self, id: &NodeId) -> Result<(), StoreError>;

    /// Whether a node with this id exists.
    async fn node_exists(&self, id: &NodeId) -> Result<bool, StoreError>;

    /// Remove a node and every edge incident to it.
    async fn remove_node(&self, id: &NodeId) -> Result<(), StoreError>;

    /// Set a property on a node. Fails if the node does not exist.
    async fn set_node_property(
        &self,
        id: &NodeId,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Read a property from a node. `Ok(None)` when the node or the key is
    /// absent.
    async fn node_property(&self, id: &NodeId, key: &str) -> Result<Option<Value>, StoreError>;

    /// Add a labeled directed edge and return its store-assigned id.
    async fn add_edge(
        &self,
        label: &EdgeLabel,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<EdgeId, StoreError>;

    /// Remove an edge by id.
    async fn remove_edge(&self, id: &EdgeId) -> Result<(), StoreError>;

    /// Set a property on an edge. Fails if the edge does not exist.
    async fn set_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Read a property from an edge. `Ok(None)` when the edge or the key is
    /// absent.
    async fn edge_property(&self, id: &EdgeId, key: &str) -> Result<Option<Value>, StoreError>;

    /// Enumerate edges with the given label incident to a node in the given
    /// direction. An absent node yields an empty list, not an error.
    async fn edges(
        &self,
        node: &NodeId,
        label: &EdgeLabel,
        direction: Direction,
    ) -> Result<Vec<EdgeRecord>, StoreError>;

    /// Commit everything written since the previous commit.
    async fn commit(&self) -> Result<(), StoreError>;
}
