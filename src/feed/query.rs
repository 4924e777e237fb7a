//! Paginated stream and feed readers.
//!
//! Streams are a linear chain walk. Feeds are a lazy k-way merge over two
//! logically sorted sequences: the user's feed chain (each entity
//! contributing its head activity) and a priority queue of continuations
//! from entities already opened during the call. The feed chain's pre-sorted
//! order means the queue only ever holds continuations, never one entry per
//! followed entity, so a page costs O(start + count + entities opened).
//!
//! Pagination contract: `start` is a zero-based offset into the newest-first
//! sequence; requesting beyond the end returns fewer elements, never an
//! error. Readers never mutate the graph.

use crate::error::FeedError;
use crate::feed::chain;
use crate::feed::models::{entity_key, Activity};
use crate::feed::stream::{activity_sort_time, load_activity};
use crate::store::{EdgeLabel, GraphStore, NodeId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::debug;

/// An activity waiting to be emitted by the merge.
///
/// Max-heap by `sort_time`; ties are FIFO on insertion order so the merge is
/// deterministic.
struct Candidate {
    sort_time: i64,
    seq: u64,
    node: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.sort_time == other.sort_time && self.seq == other.seq
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_time
            .cmp(&other.sort_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Paginated readers over the chains the two managers maintain. Performs no
/// sorting of its own.
pub struct QueryEngine {
    store: Arc<dyn GraphStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Walk an entity's stream chain, skipping `start` activities and
    /// collecting up to `count`, newest-first. An unknown entity reads as
    /// empty.
    pub async fn stream(
        &self,
        tenant: &str,
        entity_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<Activity>, FeedError> {
        let store = self.store.as_ref();
        let mut out = Vec::new();
        if count == 0 {
            return Ok(out);
        }
        let mut cursor = entity_key(tenant, entity_id);
        let mut position = 0usize;
        while let Some(edge) = chain::next(store, &cursor, &EdgeLabel::Stream).await? {
            if position >= start {
                out.push(load_activity(store, &edge.to).await?);
                if out.len() == count {
                    break;
                }
            }
            position += 1;
            cursor = edge.to;
        }
        Ok(out)
    }

    /// Lazily merge the streams of everything the user follows.
    pub async fn feed(
        &self,
        tenant: &str,
        user_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<Activity>, FeedError> {
        let store = self.store.as_ref();
        let mut out = Vec::new();
        if count == 0 {
            return Ok(out);
        }
        let user_node = entity_key(tenant, user_id);
        let label = EdgeLabel::feed(&user_node);

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
        let mut seq = 0u64;
        let mut make = |node: NodeId, sort_time: i64| {
            let candidate = Candidate {
                sort_time,
                seq,
                node,
            };
            seq += 1;
            candidate
        };

        // Prime: first feed-chain entity's head goes into the queue, the
        // cursor advances to the second entity whose head becomes the
        // out-of-queue candidate.
        let mut cursor = chain::next(store, &user_node, &label)
            .await?
            .map(|edge| edge.to);
        if let Some(entity) = cursor.clone() {
            if let Some(head) = chain::next(store, &entity, &EdgeLabel::Stream).await? {
                let t = activity_sort_time(store, &head.to).await?;
                heap.push(make(head.to, t));
            }
            cursor = chain::next(store, &entity, &label).await?.map(|e| e.to);
        }
        let mut next_candidate = self
            .advance_entity_cursor(&mut cursor, &label, &mut make)
            .await?;

        let target = start.saturating_add(count);
        let mut emitted = 0usize;
        while emitted < target {
            let take_entity_head = match (&next_candidate, heap.peek()) {
                // The next entity's head wins only when strictly newer;
                // ties drain the queue first.
                (Some(candidate), Some(best)) => candidate.sort_time > best.sort_time,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let node = if take_entity_head {
                let Some(candidate) = next_candidate.take() else {
                    break;
                };
                self.push_successor(&mut heap, &candidate.node, &mut make)
                    .await?;
                next_candidate = self
                    .advance_entity_cursor(&mut cursor, &label, &mut make)
                    .await?;
                candidate.node
            } else {
                let Some(best) = heap.pop() else {
                    break;
                };
                self.push_successor(&mut heap, &best.node, &mut make).await?;
                best.node
            };
            if emitted >= start {
                out.push(load_activity(store, &node).await?);
            }
            emitted += 1;
        }
        debug!(
            tenant,
            user = user_id,
            start,
            count,
            returned = out.len(),
            "feed page assembled"
        );
        Ok(out)
    }

    /// Push the stream successor of an emitted activity into the queue.
    async fn push_successor(
        &self,
        heap: &mut BinaryHeap<Candidate>,
        activity: &NodeId,
        make: &mut impl FnMut(NodeId, i64) -> Candidate,
    ) -> Result<(), FeedError> {
        let store = self.store.as_ref();
        if let Some(succ) = chain::next(store, activity, &EdgeLabel::Stream).await? {
            let t = activity_sort_time(store, &succ.to).await?;
            heap.push(make(succ.to, t));
        }
        Ok(())
    }

    /// Take the head activity of the entity under the cursor, skipping
    /// entities with empty streams, and move the cursor past the entity
    /// whose head was taken.
    async fn advance_entity_cursor(
        &self,
        cursor: &mut Option<NodeId>,
        label: &EdgeLabel,
        make: &mut impl FnMut(NodeId, i64) -> Candidate,
    ) -> Result<Option<Candidate>, FeedError> {
        let store = self.store.as_ref();
        while let Some(entity) = cursor.clone() {
            let head = chain::next(store, &entity, &EdgeLabel::Stream).await?;
            *cursor = chain::next(store, &entity, label).await?.map(|e| e.to);
            if let Some(head) = head {
                let t = activity_sort_time(store, &head.to).await?;
                return Ok(Some(make(head.to, t)));
            }
        }
        Ok(None)
    }
}
