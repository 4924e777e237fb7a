//! Mutation event types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The mutation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedAction {
    ActivityAdded,
    ActivityDeleted,
    Followed,
    Unfollowed,
}

/// An event emitted after a successful mutation.
///
/// Consumed by a REST/WebSocket façade for real-time updates. Must be Clone
/// for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    pub id: Uuid,
    pub action: FeedAction,
    pub tenant_id: String,
    /// The entity whose stream or follower set changed.
    pub entity_id: String,
    /// The follower, for follow/unfollow actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// The activity, for add/delete actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl FeedEvent {
    /// Create a new event stamped with the current time.
    pub fn new(action: FeedAction, tenant_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            tenant_id: tenant_id.into(),
            entity_id: entity_id.into(),
            user_id: None,
            activity_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Set the follower (for Followed/Unfollowed).
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the activity (for ActivityAdded/ActivityDeleted).
    pub fn with_activity(mut self, activity_id: impl Into<String>) -> Self {
        self.activity_id = Some(activity_id.into());
        self
    }
}

/// Anything that can receive feed events. Emission is fire-and-forget.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: FeedEvent);
}
