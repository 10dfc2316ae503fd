//! Tiered, versioned key-value stores for cached responses.
//!
//! The registry owns a fixed set of named stores, one per tier (static,
//! dynamic, api), each qualified by the current version tag. Backends supply
//! persistence; every backend operation is atomic at the granularity of one
//! entry, which is all the concurrency control the strategies need.

mod memory;
mod registry;
mod sqlite;
mod traits;

pub use memory::MemoryBackend;
pub use registry::{Store, StoreRegistry, Tier};
pub use sqlite::SqliteBackend;
pub use traits::{CachedEntry, StoreBackend};
