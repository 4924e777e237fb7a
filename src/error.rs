//! Error taxonomy for the graph store adapter and the feed engine.
//!
//! Not-found deletes and unfollows are deliberately *not* errors — those
//! operations are idempotent and report absence through their return values.

use thiserror::Error;

/// Errors surfaced by a [`crate::store::GraphStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Attempted to create a node whose id is already taken.
    #[error("node already exists: {0}")]
    NodeExists(String),

    /// A mutation referenced a node that is not in the store.
    #[error("no such node: {0}")]
    NoSuchNode(String),

    /// A mutation referenced an edge that is not in the store.
    #[error("no such edge: {0}")]
    NoSuchEdge(String),

    /// Backend-specific failure (connection loss, transaction abort, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the feed engine's public operations.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A required identifier was empty. Fails before any mutation.
    #[error("invalid argument: {0} must not be empty")]
    InvalidArgument(&'static str),

    /// A user attempted to follow itself. Allowing this would splice the
    /// user's own node into its feed chain as a self-loop.
    #[error("user '{user}' cannot follow itself in tenant '{tenant}'")]
    SelfFollow { tenant: String, user: String },

    /// `(tenant, entity, activityId)` already exists. Fails before any
    /// chain mutation.
    #[error("duplicate activity '{activity}' for entity '{entity}' in tenant '{tenant}'")]
    DuplicateActivity {
        tenant: String,
        entity: String,
        activity: String,
    },

    /// The graph violated a chain invariant (e.g. more than one outgoing
    /// edge with a chain label, or a malformed stored property). The engine
    /// never guesses which edge is "correct"; it surfaces the node instead.
    #[error("chain corruption at node '{node}': {detail}")]
    Corruption { node: String, detail: String },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FeedError {
    pub(crate) fn corruption(node: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Corruption {
            node: node.into(),
            detail: detail.into(),
        }
    }
}
