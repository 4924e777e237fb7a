//! Feed chain and merged-feed tests — follow semantics, ordering across
//! entities, relocation on head change, pagination stability.
//!
//! Run with: cargo test --test feed_tests

use chrono::{TimeZone, Utc};
use feedgraph::feed::{ActivityFeed, ActivityInput, FeedEngine};
use feedgraph::store::InMemoryGraphStore;
use std::sync::Arc;

const TENANT: &str = "acme";

fn engine() -> FeedEngine {
    FeedEngine::new(Arc::new(InMemoryGraphStore::new()))
}

fn activity(id: &str, published: i64) -> ActivityInput {
    ActivityInput {
        activity_id: id.to_string(),
        published,
        updated: None,
        content: serde_json::Value::Null,
    }
}

fn keys(activities: &[feedgraph::feed::Activity]) -> Vec<(String, i64)> {
    activities
        .iter()
        .map(|a| (format!("{}/{}", a.entity_id, a.activity_id), a.sort_time))
        .collect()
}

#[tokio::test]
async fn follow_is_idempotent_and_keeps_first_timestamp() {
    let engine = engine();
    let d1 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let d2 = Utc.with_ymd_and_hms(2025, 6, 15, 8, 30, 0).unwrap();

    let first = engine.follow_entity(TENANT, "u1", "band", Some(d1)).await.unwrap();
    let second = engine.follow_entity(TENANT, "u1", "band", Some(d2)).await.unwrap();
    assert_eq!(first, d1);
    assert_eq!(second, d1);
    assert_eq!(
        engine.followed_at(TENANT, "u1", "band").await.unwrap(),
        Some(d1)
    );
}

#[tokio::test]
async fn followed_at_defaults_to_now() {
    let engine = engine();
    let before = Utc::now();
    let ts = engine.follow_entity(TENANT, "u1", "band", None).await.unwrap();
    assert!(ts >= before && ts <= Utc::now());
}

#[tokio::test]
async fn feed_merges_all_followed_streams_completely() {
    let engine = engine();
    engine.add_activity(TENANT, "a", activity("a1", 100)).await.unwrap();
    engine.add_activity(TENANT, "a", activity("a2", 400)).await.unwrap();
    engine.add_activity(TENANT, "b", activity("b1", 300)).await.unwrap();
    engine.add_activity(TENANT, "c", activity("c1", 200)).await.unwrap();
    engine.add_activity(TENANT, "c", activity("c2", 500)).await.unwrap();

    for entity in ["a", "b", "c"] {
        engine.follow_entity(TENANT, "u1", entity, None).await.unwrap();
    }

    let feed = engine.get_feed(TENANT, "u1", 0, 50).await.unwrap();
    assert_eq!(
        keys(&feed),
        [
            ("c/c2".to_string(), 500),
            ("a/a2".to_string(), 400),
            ("b/b1".to_string(), 300),
            ("c/c1".to_string(), 200),
            ("a/a1".to_string(), 100),
        ]
    );
}

#[tokio::test]
async fn new_head_reorders_feed_without_refollow() {
    let engine = engine();
    engine.add_activity(TENANT, "a", activity("a1", 1000)).await.unwrap();
    engine.add_activity(TENANT, "b", activity("b1", 2000)).await.unwrap();
    engine.follow_entity(TENANT, "u1", "a", None).await.unwrap();
    engine.follow_entity(TENANT, "u1", "b", None).await.unwrap();

    let feed = engine.get_feed(TENANT, "u1", 0, 10).await.unwrap();
    assert_eq!(keys(&feed), [("b/b1".to_string(), 2000), ("a/a1".to_string(), 1000)]);

    // A publishes something newer than B's head: A must lead the feed now.
    engine.add_activity(TENANT, "a", activity("a2", 3000)).await.unwrap();
    let feed = engine.get_feed(TENANT, "u1", 0, 10).await.unwrap();
    assert_eq!(
        keys(&feed),
        [
            ("a/a2".to_string(), 3000),
            ("b/b1".to_string(), 2000),
            ("a/a1".to_string(), 1000),
        ]
    );
}

#[tokio::test]
async fn relocation_applies_to_every_follower() {
    let engine = engine();
    engine.add_activity(TENANT, "a", activity("a1", 100)).await.unwrap();
    engine.add_activity(TENANT, "b", activity("b1", 200)).await.unwrap();
    for user in ["u1", "u2", "u3"] {
        engine.follow_entity(TENANT, user, "a", None).await.unwrap();
        engine.follow_entity(TENANT, user, "b", None).await.unwrap();
    }

    engine.add_activity(TENANT, "a", activity("a2", 300)).await.unwrap();
    for user in ["u1", "u2", "u3"] {
        let feed = engine.get_feed(TENANT, user, 0, 1).await.unwrap();
        assert_eq!(feed[0].activity_id, "a2", "stale feed order for {user}");
    }
}

#[tokio::test]
async fn pagination_is_stable() {
    let engine = engine();
    for (entity, id, t) in [
        ("a", "a1", 10),
        ("a", "a2", 40),
        ("b", "b1", 20),
        ("b", "b2", 50),
        ("c", "c1", 30),
    ] {
        engine.add_activity(TENANT, entity, activity(id, t)).await.unwrap();
    }
    for entity in ["a", "b", "c"] {
        engine.follow_entity(TENANT, "u1", entity, None).await.unwrap();
    }

    let all = engine.get_feed(TENANT, "u1", 0, 4).await.unwrap();
    let first = engine.get_feed(TENANT, "u1", 0, 2).await.unwrap();
    let second = engine.get_feed(TENANT, "u1", 2, 2).await.unwrap();
    let glued: Vec<_> = first.into_iter().chain(second).collect();
    assert_eq!(keys(&glued), keys(&all));

    // Beyond the end returns fewer elements, never an error.
    let tail = engine.get_feed(TENANT, "u1", 4, 10).await.unwrap();
    assert_eq!(tail.len(), 1);
    assert!(engine.get_feed(TENANT, "u1", 99, 10).await.unwrap().is_empty());
}

/// The scenario from the design review: A@{1000,3000}, B@{2000}; deleting
/// A's head must leave a consistent feed with no stale graph leftovers.
#[tokio::test]
async fn deleting_a_head_activity_leaves_consistent_feed() {
    let store = Arc::new(InMemoryGraphStore::new());
    let engine = FeedEngine::new(store.clone());

    engine.add_activity(TENANT, "a", activity("a-old", 1000)).await.unwrap();
    engine.add_activity(TENANT, "a", activity("a-new", 3000)).await.unwrap();
    engine.add_activity(TENANT, "b", activity("b-only", 2000)).await.unwrap();
    engine.follow_entity(TENANT, "u1", "a", None).await.unwrap();
    engine.follow_entity(TENANT, "u1", "b", None).await.unwrap();

    let feed = engine.get_feed(TENANT, "u1", 0, 3).await.unwrap();
    assert_eq!(
        keys(&feed),
        [
            ("a/a-new".to_string(), 3000),
            ("b/b-only".to_string(), 2000),
            ("a/a-old".to_string(), 1000),
        ]
    );

    engine.delete_activity(TENANT, "a", "a-new").await.unwrap();
    let feed = engine.get_feed(TENANT, "u1", 0, 2).await.unwrap();
    assert_eq!(
        keys(&feed),
        [("b/b-only".to_string(), 2000), ("a/a-old".to_string(), 1000)]
    );

    // No stale graph state: 3 entity nodes (u1, a, b) + 2 activity nodes,
    // and exactly 2 stream + 2 follows + 2 feed-chain edges.
    assert_eq!(store.node_count().await, 5);
    assert_eq!(store.edge_count().await, 6);
}

#[tokio::test]
async fn unfollow_returns_prior_timestamp_then_none() {
    let engine = engine();
    let d1 = Utc.with_ymd_and_hms(2024, 3, 3, 3, 3, 3).unwrap();
    engine.add_activity(TENANT, "a", activity("a1", 100)).await.unwrap();
    engine.follow_entity(TENANT, "u1", "a", Some(d1)).await.unwrap();

    assert_eq!(engine.unfollow_entity(TENANT, "u1", "a").await.unwrap(), Some(d1));
    assert_eq!(engine.unfollow_entity(TENANT, "u1", "a").await.unwrap(), None);
    assert_eq!(engine.unfollow_entity(TENANT, "nobody", "a").await.unwrap(), None);

    // The feed no longer carries the unfollowed entity's activities.
    assert!(engine.get_feed(TENANT, "u1", 0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn entity_with_no_activities_sorts_last_and_wakes_up() {
    let engine = engine();
    engine.add_activity(TENANT, "busy", activity("b1", 500)).await.unwrap();
    engine.follow_entity(TENANT, "u1", "quiet", None).await.unwrap();
    engine.follow_entity(TENANT, "u1", "busy", None).await.unwrap();

    let feed = engine.get_feed(TENANT, "u1", 0, 10).await.unwrap();
    assert_eq!(keys(&feed), [("busy/b1".to_string(), 500)]);

    // The quiet entity's first activity must surface without re-following.
    engine.add_activity(TENANT, "quiet", activity("q1", 900)).await.unwrap();
    let feed = engine.get_feed(TENANT, "u1", 0, 10).await.unwrap();
    assert_eq!(
        keys(&feed),
        [("quiet/q1".to_string(), 900), ("busy/b1".to_string(), 500)]
    );
}

#[tokio::test]
async fn followers_and_following_listings() {
    let engine = engine();
    let d = Utc.with_ymd_and_hms(2024, 5, 5, 5, 5, 5).unwrap();
    engine.follow_entity(TENANT, "u1", "a", Some(d)).await.unwrap();
    engine.follow_entity(TENANT, "u1", "b", Some(d)).await.unwrap();
    engine.follow_entity(TENANT, "u2", "a", Some(d)).await.unwrap();

    let mut following: Vec<_> = engine
        .following(TENANT, "u1")
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    following.sort();
    assert_eq!(following, ["a", "b"]);

    let mut followers: Vec<_> = engine
        .followers(TENANT, "a")
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    followers.sort();
    assert_eq!(followers, ["u1", "u2"]);

    assert!(engine.following(TENANT, "stranger").await.unwrap().is_empty());
    assert!(engine.followers(TENANT, "unknown").await.unwrap().is_empty());
}

#[tokio::test]
async fn tenants_are_isolated() {
    let engine = engine();
    engine.add_activity("t1", "shared", activity("a1", 100)).await.unwrap();
    engine.add_activity("t2", "shared", activity("a2", 200)).await.unwrap();
    engine.follow_entity("t1", "u1", "shared", None).await.unwrap();

    let feed = engine.get_feed("t1", "u1", 0, 10).await.unwrap();
    assert_eq!(keys(&feed), [("shared/a1".to_string(), 100)]);
    assert!(engine.get_feed("t2", "u1", 0, 10).await.unwrap().is_empty());

    let stream = engine.get_stream("t2", "shared", 0, 10).await.unwrap();
    assert_eq!(keys(&stream), [("shared/a2".to_string(), 200)]);
}

#[tokio::test]
async fn equal_sort_times_across_entities_merge_deterministically() {
    let engine = engine();
    engine.add_activity(TENANT, "a", activity("a1", 100)).await.unwrap();
    engine.add_activity(TENANT, "b", activity("b1", 100)).await.unwrap();
    engine.follow_entity(TENANT, "u1", "a", None).await.unwrap();
    engine.follow_entity(TENANT, "u1", "b", None).await.unwrap();

    let feed = engine.get_feed(TENANT, "u1", 0, 10).await.unwrap();
    assert_eq!(feed.len(), 2);
    let mut seen: Vec<_> = feed.iter().map(|a| a.entity_id.as_str()).collect();
    seen.sort();
    assert_eq!(seen, ["a", "b"]);
}
