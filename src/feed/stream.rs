//! Stream Chain Manager.
//!
//! Maintains, per entity, a singly linked chain of activities sorted by
//! descending `sortTime`. Inserts walk the chain from the entity node to the
//! first position whose activity is not newer than the incoming one, so a
//! new activity with a tied `sortTime` lands *before* existing equal-time
//! entries. Writes cost O(chain length); no index by activity id is kept.

use crate::error::FeedError;
use crate::feed::chain;
use crate::feed::models::{activity_key, entity_key, props, Activity, ActivityInput};
use crate::store::{EdgeLabel, GraphStore, NodeId};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Read the `sortTime` property of an activity node.
pub(crate) async fn activity_sort_time(
    store: &dyn GraphStore,
    node: &NodeId,
) -> Result<i64, FeedError> {
    store
        .node_property(node, props::SORT_TIME)
        .await?
        .and_then(|v| v.as_i64())
        .ok_or_else(|| FeedError::corruption(node.as_str(), "missing or malformed sortTime"))
}

/// Hydrate a full [`Activity`] from an activity node's properties.
pub(crate) async fn load_activity(
    store: &dyn GraphStore,
    node: &NodeId,
) -> Result<Activity, FeedError> {
    let string_prop = |key: &'static str, value: Option<serde_json::Value>| {
        value
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| FeedError::corruption(node.as_str(), format!("missing {key}")))
    };
    let tenant_id = string_prop(
        props::TENANT_ID,
        store.node_property(node, props::TENANT_ID).await?,
    )?;
    let entity_id = string_prop(
        props::ENTITY_ID,
        store.node_property(node, props::ENTITY_ID).await?,
    )?;
    let activity_id = string_prop(
        props::ACTIVITY_ID,
        store.node_property(node, props::ACTIVITY_ID).await?,
    )?;
    let created_at = string_prop(
        props::CREATED_AT,
        store.node_property(node, props::CREATED_AT).await?,
    )?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|_| FeedError::corruption(node.as_str(), "malformed createdAt"))?
        .with_timezone(&Utc);
    Ok(Activity {
        tenant_id,
        entity_id,
        activity_id,
        sort_time: activity_sort_time(store, node).await?,
        created_at,
        content: store
            .node_property(node, props::CONTENT)
            .await?
            .unwrap_or(serde_json::Value::Null),
    })
}

/// The `sortTime` of an entity's head (newest) activity, `None` for an
/// entity with an empty stream chain or no node at all.
pub(crate) async fn head_sort_time(
    store: &dyn GraphStore,
    entity_node: &NodeId,
) -> Result<Option<i64>, FeedError> {
    match chain::next(store, entity_node, &EdgeLabel::Stream).await? {
        Some(edge) => Ok(Some(activity_sort_time(store, &edge.to).await?)),
        None => Ok(None),
    }
}

/// Resolve an entity node, creating it lazily on first write reference.
/// Any feed participant — stream owner or follower — is an entity node.
pub(crate) async fn ensure_entity(
    store: &dyn GraphStore,
    tenant: &str,
    entity_id: &str,
) -> Result<NodeId, FeedError> {
    let node = entity_key(tenant, entity_id);
    if !store.node_exists(&node).await? {
        store.create_node(&node).await?;
        store
            .set_node_property(&node, props::TENANT_ID, json!(tenant))
            .await?;
        store
            .set_node_property(&node, props::ENTITY_ID, json!(entity_id))
            .await?;
        store
            .set_node_property(&node, props::CREATED_AT, json!(Utc::now().to_rfc3339()))
            .await?;
        debug!(tenant, entity = entity_id, "entity node created");
    }
    Ok(node)
}

/// Maintains per-entity activity chains.
pub struct StreamChainManager {
    store: Arc<dyn GraphStore>,
}

impl StreamChainManager {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Insert an activity into the entity's stream chain.
    ///
    /// Rejects a duplicate `(tenant, entity, activityId)` before any
    /// mutation. Returns the stored activity and whether it became the chain
    /// head — a head change obliges the caller to relocate the entity in
    /// every follower's feed chain.
    pub async fn insert(
        &self,
        tenant: &str,
        entity_id: &str,
        input: &ActivityInput,
    ) -> Result<(Activity, bool), FeedError> {
        let activity_node = activity_key(tenant, entity_id, &input.activity_id);
        if self.store.node_exists(&activity_node).await? {
            return Err(FeedError::DuplicateActivity {
                tenant: tenant.to_string(),
                entity: entity_id.to_string(),
                activity: input.activity_id.clone(),
            });
        }
        let entity_node = ensure_entity(self.store.as_ref(), tenant, entity_id).await?;

        // Find the splice point before creating anything: the first position
        // whose activity is not newer. Ties stop the walk so the new entry
        // lands before existing equal-time ones. Walking first also means a
        // corrupt chain aborts the write with no partial state.
        let sort_time = input.sort_time();
        let label = EdgeLabel::Stream;
        let mut prev = entity_node.clone();
        while let Some(edge) = chain::next(self.store.as_ref(), &prev, &label).await? {
            if activity_sort_time(self.store.as_ref(), &edge.to).await? > sort_time {
                prev = edge.to;
            } else {
                break;
            }
        }

        let created_at = Utc::now();
        self.store.create_node(&activity_node).await?;
        for (key, value) in [
            (props::TENANT_ID, json!(tenant)),
            (props::ENTITY_ID, json!(entity_id)),
            (props::ACTIVITY_ID, json!(input.activity_id)),
            (props::SORT_TIME, json!(sort_time)),
            (props::CREATED_AT, json!(created_at.to_rfc3339())),
            (props::CONTENT, input.content.clone()),
        ] {
            self.store
                .set_node_property(&activity_node, key, value)
                .await?;
        }
        chain::splice_after(self.store.as_ref(), &prev, &label, &activity_node).await?;
        let became_head = prev == entity_node;
        debug!(
            tenant,
            entity = entity_id,
            activity = %input.activity_id,
            sort_time,
            became_head,
            "activity spliced into stream chain"
        );

        let activity = Activity {
            tenant_id: tenant.to_string(),
            entity_id: entity_id.to_string(),
            activity_id: input.activity_id.clone(),
            sort_time,
            created_at,
            content: input.content.clone(),
        };
        Ok((activity, became_head))
    }

    /// Remove an activity from the entity's stream chain.
    ///
    /// Idempotent: an absent entity or activity is a no-op success. Returns
    /// `Some(was_head)` when an activity was actually removed, `None`
    /// otherwise.
    pub async fn remove(
        &self,
        tenant: &str,
        entity_id: &str,
        activity_id: &str,
    ) -> Result<Option<bool>, FeedError> {
        let entity_node = entity_key(tenant, entity_id);
        if !self.store.node_exists(&entity_node).await? {
            return Ok(None);
        }
        let target = activity_key(tenant, entity_id, activity_id);
        match chain::unlink(self.store.as_ref(), &entity_node, &EdgeLabel::Stream, &target).await? {
            Some(was_head) => {
                self.store.remove_node(&target).await?;
                debug!(
                    tenant,
                    entity = entity_id,
                    activity = activity_id,
                    was_head,
                    "activity removed from stream chain"
                );
                Ok(Some(was_head))
            }
            None => Ok(None),
        }
    }
}
