//! Chain traversal and splice primitives shared by the stream and feed
//! chain managers.
//!
//! A chain is a singly linked sequence of nodes connected by same-labeled
//! edges. Every node carries at most one outgoing edge per chain label;
//! observing more than one is corruption and surfaces as an error rather
//! than an arbitrary pick.

use crate::error::FeedError;
use crate::store::{Direction, EdgeLabel, EdgeRecord, GraphStore, NodeId};

/// The single outgoing chain edge of `node`, if any.
pub(crate) async fn next(
    store: &dyn GraphStore,
    node: &NodeId,
    label: &EdgeLabel,
) -> Result<Option<EdgeRecord>, FeedError> {
    let mut edges = store.edges(node, label, Direction::Outgoing).await?;
    if edges.len() > 1 {
        return Err(FeedError::corruption(
            node.as_str(),
            format!("{} outgoing '{label}' edges", edges.len()),
        ));
    }
    Ok(edges.pop())
}

/// Splice `new_node` into the chain directly after `prev`: redirect the one
/// outgoing chain edge of `prev` (if any) to leave `new_node`, and point
/// `prev` at `new_node`.
pub(crate) async fn splice_after(
    store: &dyn GraphStore,
    prev: &NodeId,
    label: &EdgeLabel,
    new_node: &NodeId,
) -> Result<(), FeedError> {
    let old = next(store, prev, label).await?;
    if let Some(edge) = &old {
        store.remove_edge(&edge.id).await?;
    }
    store.add_edge(label, prev, new_node).await?;
    if let Some(edge) = old {
        store.add_edge(label, new_node, &edge.to).await?;
    }
    Ok(())
}

/// Walk the chain from `head` and splice `target` out, reconnecting its
/// predecessor to its successor.
///
/// Returns `Some(was_first)` when `target` was found (`was_first` = it sat
/// directly after `head`, i.e. it was the chain head), `None` when the chain
/// does not contain `target`.
pub(crate) async fn unlink(
    store: &dyn GraphStore,
    head: &NodeId,
    label: &EdgeLabel,
    target: &NodeId,
) -> Result<Option<bool>, FeedError> {
    let mut prev = head.clone();
    let mut first = true;
    while let Some(edge) = next(store, &prev, label).await? {
        if edge.to == *target {
            let succ = next(store, target, label).await?;
            store.remove_edge(&edge.id).await?;
            if let Some(succ) = succ {
                store.remove_edge(&succ.id).await?;
                store.add_edge(label, &prev, &succ.to).await?;
            }
            return Ok(Some(first));
        }
        prev = edge.to;
        first = false;
    }
    Ok(None)
}
