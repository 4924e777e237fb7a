//! Graph store adapter.
//!
//! - [`traits`] — the [`GraphStore`] trait the engine consumes
//! - [`models`] — node/edge references, labels, directions
//! - [`memory`] — arena-backed in-memory implementation

pub mod memory;
pub mod models;
pub mod traits;

pub use memory::InMemoryGraphStore;
pub use models::{Direction, EdgeId, EdgeLabel, EdgeRecord, NodeId};
pub use traits::GraphStore;
