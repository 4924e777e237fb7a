//! Graph store value types: node and edge references, labels, directions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a node in the graph.
///
/// Node ids are tenant-qualified strings constructed by the key functions in
/// [`crate::feed::models`]; the store never interprets them beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of an edge, assigned by the store on insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Edge label. Chain labels are typed so call sites cannot mistype them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeLabel {
    /// Links a node to the next-older activity in an entity's stream chain.
    Stream,
    /// User node → followed entity node.
    Follows,
    /// Links a node to the next entity in one user's feed chain. The payload
    /// is the user's node id, making the label unique per user.
    Feed(String),
}

impl EdgeLabel {
    /// The feed-chain label for a given user node.
    pub fn feed(user: &NodeId) -> Self {
        Self::Feed(user.as_str().to_string())
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => f.write_str("stream"),
            Self::Follows => f.write_str("follows"),
            Self::Feed(user) => write!(f, "feed/{user}"),
        }
    }
}

/// Direction of edge traversal relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// An edge as returned by [`crate::store::GraphStore::edges`].
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub label: EdgeLabel,
    pub from: NodeId,
    pub to: NodeId,
}
