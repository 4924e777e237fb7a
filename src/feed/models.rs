//! Tenant-scoped identifiers and the activity model.

use crate::store::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Property keys used on graph nodes and edges.
pub(crate) mod props {
    pub const TENANT_ID: &str = "tenantId";
    pub const ENTITY_ID: &str = "entityId";
    pub const ACTIVITY_ID: &str = "activityId";
    pub const SORT_TIME: &str = "sortTime";
    pub const CREATED_AT: &str = "createdAt";
    pub const CONTENT: &str = "content";
    pub const FOLLOWED_AT: &str = "followedAt";
}

/// Node id of an entity (any feed participant — user or content source).
pub(crate) fn entity_key(tenant: &str, entity_id: &str) -> NodeId {
    NodeId::new(format!("{tenant}/entity/{entity_id}"))
}

/// Node id of an activity. Identity is `(tenant, entity, activityId)`.
pub(crate) fn activity_key(tenant: &str, entity_id: &str, activity_id: &str) -> NodeId {
    NodeId::new(format!("{tenant}/activity/{entity_id}/{activity_id}"))
}

/// What a caller supplies to `add_activity`.
///
/// Timestamps are epoch milliseconds. The chains sort on `updated` when
/// present, else `published`; `content` is opaque and never inspected after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityInput {
    pub activity_id: String,
    pub published: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl ActivityInput {
    /// The single field chains sort on.
    pub fn sort_time(&self) -> i64 {
        self.updated.unwrap_or(self.published)
    }
}

/// A stored activity, as returned by stream and feed reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub tenant_id: String,
    pub entity_id: String,
    pub activity_id: String,
    pub sort_time: i64,
    pub created_at: DateTime<Utc>,
    pub content: serde_json::Value,
}

/// One entry in a `following` or `followers` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowInfo {
    /// Tenant-local id of the counterpart (followed entity, or follower).
    pub id: String,
    pub followed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_time_prefers_updated() {
        let input = ActivityInput {
            activity_id: "a1".into(),
            published: 100,
            updated: Some(250),
            content: serde_json::Value::Null,
        };
        assert_eq!(input.sort_time(), 250);
    }

    #[test]
    fn sort_time_falls_back_to_published() {
        let input = ActivityInput {
            activity_id: "a1".into(),
            published: 100,
            updated: None,
            content: serde_json::Value::Null,
        };
        assert_eq!(input.sort_time(), 100);
    }

    #[test]
    fn keys_are_tenant_qualified() {
        assert_eq!(entity_key("t1", "alice").as_str(), "t1/entity/alice");
        assert_eq!(
            activity_key("t1", "alice", "a9").as_str(),
            "t1/activity/alice/a9"
        );
        assert_ne!(entity_key("t1", "alice"), entity_key("t2", "alice"));
    }
}
