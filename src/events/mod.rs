//! Mutation event system
//!
//! - `FeedEvent` — typed events emitted after every successful mutation
//! - `EventBus` — broadcast channel distributing events to façade clients

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{EventEmitter, FeedAction, FeedEvent};
