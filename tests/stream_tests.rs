//! Stream chain tests — ordering, duplicates, idempotent deletes, paging.
//!
//! Run with: cargo test --test stream_tests

use feedgraph::error::FeedError;
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

fn ids(activities: &[feedgraph::feed::Activity]) -> Vec<&str> {
    activities.iter().map(|a| a.activity_id.as_str()).collect()
}

fn times(activities: &[feedgraph::feed::Activity]) -> Vec<i64> {
    activities.iter().map(|a| a.sort_time).collect()
}

#[tokio::test]
async fn stream_orders_descending_regardless_of_insert_order() {
    let engine = engine();
    for (id, t) in [("a", 300), ("b", 100), ("c", 500), ("d", 200), ("e", 400)] {
        engine.add_activity(TENANT, "alice", activity(id, t)).await.unwrap();
    }
    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert_eq!(ids(&stream), ["c", "e", "a", "d", "b"]);
    assert_eq!(times(&stream), [500, 400, 300, 200, 100]);
}

#[tokio::test]
async fn equal_sort_times_keep_newest_insertion_first() {
    let engine = engine();
    for id in ["first", "second", "third"] {
        engine.add_activity(TENANT, "alice", activity(id, 1000)).await.unwrap();
    }
    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert_eq!(ids(&stream), ["third", "second", "first"]);
}

#[tokio::test]
async fn updated_timestamp_wins_over_published() {
    let engine = engine();
    engine.add_activity(TENANT, "alice", activity("old", 100)).await.unwrap();
    engine
        .add_activity(
            TENANT,
            "alice",
            ActivityInput {
                activity_id: "edited".to_string(),
                published: 50,
                updated: Some(200),
                content: serde_json::Value::Null,
            },
        )
        .await
        .unwrap();
    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert_eq!(ids(&stream), ["edited", "old"]);
    assert_eq!(stream[0].sort_time, 200);
}

#[tokio::test]
async fn duplicate_activity_is_rejected_without_mutation() {
    let engine = engine();
    engine.add_activity(TENANT, "alice", activity("a1", 100)).await.unwrap();
    let err = engine
        .add_activity(TENANT, "alice", activity("a1", 999))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::DuplicateActivity { .. }));

    // The chain is untouched: still one activity at the original time.
    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert_eq!(times(&stream), [100]);

    // The same activity id under another entity or tenant is fine.
    engine.add_activity(TENANT, "bob", activity("a1", 100)).await.unwrap();
    engine.add_activity("other", "alice", activity("a1", 100)).await.unwrap();
}

#[tokio::test]
async fn delete_is_idempotent() {
    let engine = engine();
    engine.add_activity(TENANT, "alice", activity("a1", 100)).await.unwrap();

    assert!(engine.delete_activity(TENANT, "alice", "a1").await.unwrap());
    assert!(!engine.delete_activity(TENANT, "alice", "a1").await.unwrap());
    assert!(!engine.delete_activity(TENANT, "alice", "never-existed").await.unwrap());
    assert!(!engine.delete_activity(TENANT, "ghost", "a1").await.unwrap());

    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert!(stream.is_empty());
}

#[tokio::test]
async fn deleting_middle_and_head_preserves_order() {
    let engine = engine();
    for (id, t) in [("a", 100), ("b", 200), ("c", 300), ("d", 400)] {
        engine.add_activity(TENANT, "alice", activity(id, t)).await.unwrap();
    }
    engine.delete_activity(TENANT, "alice", "b").await.unwrap();
    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert_eq!(ids(&stream), ["d", "c", "a"]);

    engine.delete_activity(TENANT, "alice", "d").await.unwrap();
    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert_eq!(ids(&stream), ["c", "a"]);
}

#[tokio::test]
async fn pagination_skips_and_bounds() {
    let engine = engine();
    for i in 0..7 {
        engine
            .add_activity(TENANT, "alice", activity(&format!("a{i}"), i * 10))
            .await
            .unwrap();
    }
    let page = engine.get_stream(TENANT, "alice", 2, 3).await.unwrap();
    assert_eq!(ids(&page), ["a4", "a3", "a2"]);

    // Beyond the end returns fewer elements, never an error.
    let tail = engine.get_stream(TENANT, "alice", 5, 10).await.unwrap();
    assert_eq!(ids(&tail), ["a1", "a0"]);
    let past = engine.get_stream(TENANT, "alice", 100, 10).await.unwrap();
    assert!(past.is_empty());
    let none = engine.get_stream(TENANT, "alice", 0, 0).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn unknown_entity_reads_empty() {
    let engine = engine();
    let stream = engine.get_stream(TENANT, "nobody", 0, 10).await.unwrap();
    assert!(stream.is_empty());
}

#[tokio::test]
async fn zero_timestamp_sorts_to_tail() {
    let engine = engine();
    engine.add_activity(TENANT, "alice", activity("normal", 500)).await.unwrap();
    engine.add_activity(TENANT, "alice", activity("epoch", 0)).await.unwrap();
    engine.add_activity(TENANT, "alice", activity("later", 900)).await.unwrap();
    let stream = engine.get_stream(TENANT, "alice", 0, 10).await.unwrap();
    assert_eq!(ids(&stream), ["later", "normal", "epoch"]);
}

/// Deterministic pseudo-random add/delete sequence; the chain must stay in
/// non-increasing sortTime order after every step.
#[tokio::test]
async fn arbitrary_add_delete_sequence_keeps_invariant() {
    let engine = engine();
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut live: Vec<String> = Vec::new();
    for i in 0..60 {
        let roll = next();
        if roll % 4 == 0 && !live.is_empty() {
            let victim = live.remove((roll as usize / 4) % live.len());
            assert!(engine.delete_activity(TENANT, "alice", &victim).await.unwrap());
        } else {
            let id = format!("act-{i}");
            let t = (roll % 1000) as i64;
            engine.add_activity(TENANT, "alice", activity(&id, t)).await.unwrap();
            live.push(id);
        }

        let stream = engine.get_stream(TENANT, "alice", 0, 100).await.unwrap();
        assert_eq!(stream.len(), live.len());
        for pair in stream.windows(2) {
            assert!(
                pair[0].sort_time >= pair[1].sort_time,
                "chain out of order: {} before {}",
                pair[0].sort_time,
                pair[1].sort_time
            );
        }
    }
}
