//! Feed Chain Manager.
//!
//! Maintains, per user, a singly linked chain of followed entities ordered
//! by each entity's most-recent-activity `sortTime` (an entity with no
//! activities sorts as `i64::MIN`). Reacts to stream-chain head changes by
//! relocating the affected entity in every follower's chain — an
//! O(followers × chain depth) operation that is the dominant cost of a
//! head-changing write.

use crate::error::FeedError;
use crate::feed::chain;
use crate::feed::models::{entity_key, props, FollowInfo};
use crate::feed::stream::{ensure_entity, head_sort_time};
use crate::store::{Direction, EdgeLabel, EdgeRecord, GraphStore, NodeId};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Maintains per-user feed chains and the follow edges behind them.
pub struct FeedChainManager {
    store: Arc<dyn GraphStore>,
}

impl FeedChainManager {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// The `follows` edge from `user_node` to `entity_node`, if any.
    /// Two edges for the same pair is corruption.
    async fn follow_edge(
        &self,
        user_node: &NodeId,
        entity_node: &NodeId,
    ) -> Result<Option<EdgeRecord>, FeedError> {
        let mut matches: Vec<EdgeRecord> = self
            .store
            .edges(user_node, &EdgeLabel::Follows, Direction::Outgoing)
            .await?
            .into_iter()
            .filter(|edge| edge.to == *entity_node)
            .collect();
        if matches.len() > 1 {
            return Err(FeedError::corruption(
                user_node.as_str(),
                format!("{} 'follows' edges to {entity_node}", matches.len()),
            ));
        }
        Ok(matches.pop())
    }

    async fn stored_followed_at(&self, edge: &EdgeRecord) -> Result<DateTime<Utc>, FeedError> {
        let value = self
            .store
            .edge_property(&edge.id, props::FOLLOWED_AT)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| {
                FeedError::corruption(edge.from.as_str(), "follows edge missing followedAt")
            })?;
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| FeedError::corruption(edge.from.as_str(), "malformed followedAt"))
    }

    /// Splice `entity_node` into the user's feed chain at the position its
    /// current head-activity `sortTime` dictates. Same descending/tie
    /// semantics as stream insertion.
    async fn insert_into_feed_chain(
        &self,
        user_node: &NodeId,
        entity_node: &NodeId,
    ) -> Result<(), FeedError> {
        let store = self.store.as_ref();
        let label = EdgeLabel::feed(user_node);
        let key = head_sort_time(store, entity_node).await?.unwrap_or(i64::MIN);
        let mut prev = user_node.clone();
        while let Some(edge) = chain::next(store, &prev, &label).await? {
            let position = head_sort_time(store, &edge.to).await?.unwrap_or(i64::MIN);
            if position > key {
                prev = edge.to;
            } else {
                break;
            }
        }
        chain::splice_after(store, &prev, &label, entity_node).await
    }

    /// Create (or confirm) the follow relationship and place the entity in
    /// the user's feed chain.
    ///
    /// Idempotent: an existing follow returns its stored timestamp
    /// unchanged, regardless of `followed_at`. A user cannot follow itself:
    /// the feed chain links entity nodes, so a self-follow would put the
    /// user's own node on its chain as a self-loop.
    pub async fn follow(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
        followed_at: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, FeedError> {
        if user_id == entity_id {
            return Err(FeedError::SelfFollow {
                tenant: tenant.to_string(),
                user: user_id.to_string(),
            });
        }
        let user_node = ensure_entity(self.store.as_ref(), tenant, user_id).await?;
        let entity_node = ensure_entity(self.store.as_ref(), tenant, entity_id).await?;

        if let Some(edge) = self.follow_edge(&user_node, &entity_node).await? {
            return self.stored_followed_at(&edge).await;
        }

        let ts = followed_at.unwrap_or_else(Utc::now);
        let edge = self
            .store
            .add_edge(&EdgeLabel::Follows, &user_node, &entity_node)
            .await?;
        self.store
            .set_edge_property(&edge, props::FOLLOWED_AT, json!(ts.to_rfc3339()))
            .await?;
        self.insert_into_feed_chain(&user_node, &entity_node).await?;
        debug!(tenant, user = user_id, entity = entity_id, "follow created");
        Ok(ts)
    }

    /// Remove the follow relationship and splice the entity out of the
    /// user's feed chain. Returns the prior follow timestamp, or `None` if
    /// the user was not following (a no-op, not an error).
    pub async fn unfollow(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
    ) -> Result<Option<DateTime<Utc>>, FeedError> {
        let user_node = entity_key(tenant, user_id);
        let entity_node = entity_key(tenant, entity_id);
        if !self.store.node_exists(&user_node).await? {
            return Ok(None);
        }
        let Some(edge) = self.follow_edge(&user_node, &entity_node).await? else {
            return Ok(None);
        };
        let ts = self.stored_followed_at(&edge).await?;
        self.store.remove_edge(&edge.id).await?;
        chain::unlink(
            self.store.as_ref(),
            &user_node,
            &EdgeLabel::feed(&user_node),
            &entity_node,
        )
        .await?;
        debug!(tenant, user = user_id, entity = entity_id, "follow removed");
        Ok(Some(ts))
    }

    /// Re-position the entity in every follower's feed chain after its head
    /// activity changed.
    ///
    /// The follow edge (and its timestamp) is left untouched; only the feed
    /// chain placement moves. Returns the number of followers touched —
    /// this walk is O(followers × chain depth) by design.
    pub async fn relocate_followers(
        &self,
        tenant: &str,
        entity_id: &str,
    ) -> Result<usize, FeedError> {
        let entity_node = entity_key(tenant, entity_id);
        let followers = self
            .store
            .edges(&entity_node, &EdgeLabel::Follows, Direction::Incoming)
            .await?;
        for edge in &followers {
            let user_node = &edge.from;
            chain::unlink(
                self.store.as_ref(),
                user_node,
                &EdgeLabel::feed(user_node),
                &entity_node,
            )
            .await?;
            self.insert_into_feed_chain(user_node, &entity_node).await?;
        }
        debug!(
            tenant,
            entity = entity_id,
            followers = followers.len(),
            "entity relocated in follower feed chains"
        );
        Ok(followers.len())
    }

    /// When the user followed the entity, `None` if they are not following.
    pub async fn followed_at(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
    ) -> Result<Option<DateTime<Utc>>, FeedError> {
        let user_node = entity_key(tenant, user_id);
        let entity_node = entity_key(tenant, entity_id);
        match self.follow_edge(&user_node, &entity_node).await? {
            Some(edge) => Ok(Some(self.stored_followed_at(&edge).await?)),
            None => Ok(None),
        }
    }

    /// Entities the user follows. Order is not significant.
    pub async fn following(
        &self,
        tenant: &str,
        user_id: &str,
    ) -> Result<Vec<FollowInfo>, FeedError> {
        let user_node = entity_key(tenant, user_id);
        let edges = self
            .store
            .edges(&user_node, &EdgeLabel::Follows, Direction::Outgoing)
            .await?;
        let mut out = Vec::with_capacity(edges.len());
        for edge in edges {
            out.push(FollowInfo {
                id: self.local_entity_id(&edge.to).await?,
                followed_at: self.stored_followed_at(&edge).await?,
            });
        }
        Ok(out)
    }

    /// Users following the entity. Order is not significant.
    pub async fn followers(
        &self,
        tenant: &str,
        entity_id: &str,
    ) -> Result<Vec<FollowInfo>, FeedError> {
        let entity_node = entity_key(tenant, entity_id);
        let edges = self
            .store
            .edges(&entity_node, &EdgeLabel::Follows, Direction::Incoming)
            .await?;
        let mut out = Vec::with_capacity(edges.len());
        for edge in edges {
            out.push(FollowInfo {
                id: self.local_entity_id(&edge.from).await?,
                followed_at: self.stored_followed_at(&edge).await?,
            });
        }
        Ok(out)
    }

    async fn local_entity_id(&self, node: &NodeId) -> Result<String, FeedError> {
        self.store
            .node_property(node, props::ENTITY_ID)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| FeedError::corruption(node.as_str(), "missing entityId"))
    }
}
