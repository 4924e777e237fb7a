//! Feed engine — the exposed reader/writer contract.
//!
//! The `ActivityFeed` trait is the single entry point for all feed
//! consumers (REST façade, administrative and export tooling). `FeedEngine`
//! implements it over `Arc<dyn GraphStore>` and coordinates the pieces:
//!
//! 1. **Stream writes** go through the [`StreamChainManager`]; a write that
//!    changes an entity's head activity triggers follower relocation in the
//!    [`FeedChainManager`].
//! 2. **Reads** go through the [`QueryEngine`] and never mutate the graph.
//! 3. Each public write ends in exactly one `commit()` — the store's
//!    atomicity boundary — and then emits a [`FeedEvent`].
//!
//! The trait also enables mocking in downstream consumer tests.

use crate::error::FeedError;
use crate::events::{EventEmitter, FeedAction, FeedEvent};
use crate::feed::follows::FeedChainManager;
use crate::feed::models::{Activity, ActivityInput, FollowInfo};
use crate::feed::query::QueryEngine;
use crate::feed::stream::StreamChainManager;
use crate::store::GraphStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Relocation fan-outs above this many followers get a warning log; the
/// O(followers × chain depth) cost is by contract, but operators should see
/// when it starts to bite.
const RELOCATION_WARN_THRESHOLD: usize = 1_000;

/// Page-size limits applied by the engine façade.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { max_page_size: 500 }
    }
}

/// The reader/writer contract of the feed service.
///
/// Consumers use `Arc<dyn ActivityFeed>` for dependency injection.
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    /// Publish an activity to an entity's stream.
    ///
    /// Fails with [`FeedError::DuplicateActivity`] if the
    /// `(tenant, entity, activityId)` triple already exists; no chain state
    /// is touched in that case.
    async fn add_activity(
        &self,
        tenant: &str,
        entity_id: &str,
        input: ActivityInput,
    ) -> Result<Activity, FeedError>;

    /// Delete an activity from an entity's stream. Idempotent: deleting an
    /// absent activity is a no-op success. Returns whether an activity was
    /// actually removed.
    async fn delete_activity(
        &self,
        tenant: &str,
        entity_id: &str,
        activity_id: &str,
    ) -> Result<bool, FeedError>;

    /// Page through an entity's stream, newest-first.
    async fn get_stream(
        &self,
        tenant: &str,
        entity_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<Activity>, FeedError>;

    /// Follow an entity. Idempotent: an existing follow keeps and returns
    /// its original timestamp. `followed_at` defaults to now. Fails with
    /// [`FeedError::SelfFollow`] when the user and entity are the same.
    async fn follow_entity(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
        followed_at: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, FeedError>;

    /// Unfollow an entity. Returns the prior follow timestamp, or `None`
    /// when the user was not following.
    async fn unfollow_entity(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
    ) -> Result<Option<DateTime<Utc>>, FeedError>;

    /// Page through the merged feed of everything the user follows,
    /// newest-first.
    async fn get_feed(
        &self,
        tenant: &str,
        user_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<Activity>, FeedError>;

    /// When the user followed the entity, `None` if they are not following.
    async fn followed_at(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
    ) -> Result<Option<DateTime<Utc>>, FeedError>;

    /// Entities the user follows.
    async fn following(&self, tenant: &str, user_id: &str) -> Result<Vec<FollowInfo>, FeedError>;

    /// Users following the entity.
    async fn followers(&self, tenant: &str, entity_id: &str)
        -> Result<Vec<FollowInfo>, FeedError>;
}

/// Production implementation of [`ActivityFeed`] over a graph store.
pub struct FeedEngine {
    store: Arc<dyn GraphStore>,
    streams: StreamChainManager,
    follows: FeedChainManager,
    queries: QueryEngine,
    events: Option<Arc<dyn EventEmitter>>,
    limits: PageLimits,
}

impl FeedEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            streams: StreamChainManager::new(store.clone()),
            follows: FeedChainManager::new(store.clone()),
            queries: QueryEngine::new(store.clone()),
            store,
            events: None,
            limits: PageLimits::default(),
        }
    }

    /// Attach an event emitter (builder pattern). Events fire after the
    /// write has committed.
    pub fn with_event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.events = Some(emitter);
        self
    }

    /// Override the default page limits (builder pattern).
    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    fn clamp(&self, count: usize) -> usize {
        count.min(self.limits.max_page_size)
    }

    fn emit(&self, event: FeedEvent) {
        if let Some(emitter) = &self.events {
            emitter.emit(event);
        }
    }

    /// Relocate the entity in every follower's feed chain after a head
    /// change, logging when the fan-out is large.
    async fn handle_head_change(&self, tenant: &str, entity_id: &str) -> Result<(), FeedError> {
        let relocated = self.follows.relocate_followers(tenant, entity_id).await?;
        if relocated > RELOCATION_WARN_THRESHOLD {
            warn!(
                tenant,
                entity = entity_id,
                followers = relocated,
                "head change fanned out to a large follower set"
            );
        }
        Ok(())
    }
}

fn require(value: &str, what: &'static str) -> Result<(), FeedError> {
    if value.is_empty() {
        return Err(FeedError::InvalidArgument(what));
    }
    Ok(())
}

#[async_trait]
impl ActivityFeed for FeedEngine {
    async fn add_activity(
        &self,
        tenant: &str,
        entity_id: &str,
        input: ActivityInput,
    ) -> Result<Activity, FeedError> {
        require(tenant, "tenant")?;
        require(entity_id, "entityId")?;
        require(&input.activity_id, "activityId")?;

        let (activity, became_head) = self.streams.insert(tenant, entity_id, &input).await?;
        if became_head {
            self.handle_head_change(tenant, entity_id).await?;
        }
        self.store.commit().await?;
        info!(
            tenant,
            entity = entity_id,
            activity = %activity.activity_id,
            became_head,
            "activity added"
        );
        self.emit(
            FeedEvent::new(FeedAction::ActivityAdded, tenant, entity_id)
                .with_activity(&activity.activity_id),
        );
        Ok(activity)
    }

    async fn delete_activity(
        &self,
        tenant: &str,
        entity_id: &str,
        activity_id: &str,
    ) -> Result<bool, FeedError> {
        require(tenant, "tenant")?;
        require(entity_id, "entityId")?;
        require(activity_id, "activityId")?;

        let removed = self.streams.remove(tenant, entity_id, activity_id).await?;
        if let Some(was_head) = removed {
            if was_head {
                self.handle_head_change(tenant, entity_id).await?;
            }
            self.store.commit().await?;
            info!(
                tenant,
                entity = entity_id,
                activity = activity_id,
                was_head,
                "activity deleted"
            );
            self.emit(
                FeedEvent::new(FeedAction::ActivityDeleted, tenant, entity_id)
                    .with_activity(activity_id),
            );
        }
        Ok(removed.is_some())
    }

    async fn get_stream(
        &self,
        tenant: &str,
        entity_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<Activity>, FeedError> {
        require(tenant, "tenant")?;
        require(entity_id, "entityId")?;
        self.queries
            .stream(tenant, entity_id, start, self.clamp(count))
            .await
    }

    async fn follow_entity(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
        followed_at: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, FeedError> {
        require(tenant, "tenant")?;
        require(user_id, "userId")?;
        require(entity_id, "entityId")?;

        let ts = self
            .follows
            .follow(tenant, user_id, entity_id, followed_at)
            .await?;
        self.store.commit().await?;
        info!(tenant, user = user_id, entity = entity_id, "follow recorded");
        self.emit(FeedEvent::new(FeedAction::Followed, tenant, entity_id).with_user(user_id));
        Ok(ts)
    }

    async fn unfollow_entity(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
    ) -> Result<Option<DateTime<Utc>>, FeedError> {
        require(tenant, "tenant")?;
        require(user_id, "userId")?;
        require(entity_id, "entityId")?;

        let prior = self.follows.unfollow(tenant, user_id, entity_id).await?;
        if prior.is_some() {
            self.store.commit().await?;
            info!(tenant, user = user_id, entity = entity_id, "follow removed");
            self.emit(FeedEvent::new(FeedAction::Unfollowed, tenant, entity_id).with_user(user_id));
        }
        Ok(prior)
    }

    async fn get_feed(
        &self,
        tenant: &str,
        user_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<Activity>, FeedError> {
        require(tenant, "tenant")?;
        require(user_id, "userId")?;
        self.queries
            .feed(tenant, user_id, start, self.clamp(count))
            .await
    }

    async fn followed_at(
        &self,
        tenant: &str,
        user_id: &str,
        entity_id: &str,
    ) -> Result<Option<DateTime<Utc>>, FeedError> {
        require(tenant, "tenant")?;
        require(user_id, "userId")?;
        require(entity_id, "entityId")?;
        self.follows.followed_at(tenant, user_id, entity_id).await
    }

    async fn following(&self, tenant: &str, user_id: &str) -> Result<Vec<FollowInfo>, FeedError> {
        require(tenant, "tenant")?;
        require(user_id, "userId")?;
        self.follows.following(tenant, user_id).await
    }

    async fn followers(
        &self,
        tenant: &str,
        entity_id: &str,
    ) -> Result<Vec<FollowInfo>, FeedError> {
        require(tenant, "tenant")?;
        require(entity_id, "entityId")?;
        self.follows.followers(tenant, entity_id).await
    }
}
