//! The feed index engine.
//!
//! Entities publish timestamped activities; users follow entities and read
//! an aggregated, chronologically merged feed. Two interlocking order
//! invariants are maintained with local graph edits only:
//!
//! ```text
//! entity ──stream──► a@t9 ──stream──► a@t4 ──stream──► a@t1
//!
//! user ──feed/u──► entityB ──feed/u──► entityA ──feed/u──► entityC
//!        (sorted by each entity's head-activity sortTime, descending)
//! ```
//!
//! ## Modules
//!
//! - [`models`] — tenant-scoped identifiers and the activity model
//! - [`chain`] — shared chain traversal/splice primitives
//! - [`stream`] — Stream Chain Manager (per-entity activity chains)
//! - [`follows`] — Feed Chain Manager (per-user followed-entity chains)
//! - [`query`] — paginated readers; lazy k-way merge for feeds
//! - [`engine`] — `ActivityFeed` trait and the `FeedEngine` orchestrator

pub(crate) mod chain;
pub mod engine;
pub mod follows;
pub mod models;
pub mod query;
pub mod stream;

pub use engine::{ActivityFeed, FeedEngine, PageLimits};
pub use follows::FeedChainManager;
pub use models::{Activity, ActivityInput, FollowInfo};
pub use query::QueryEngine;
pub use stream::StreamChainManager;
