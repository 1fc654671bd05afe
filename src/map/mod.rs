//! Map implementations
//!
//! This module provides two interchangeable concurrent unordered maps.
//!
//! ## Available Maps
//!
//! - [`UnorderedMap`]: one hash table behind one readers-writer lock
//! - [`ShardedUnorderedMap`]: the same abstraction partitioned over N
//!   independently locked shards
//!
//! ## Choosing a Map
//!
//! - Use `UnorderedMap` when the map is small or mostly read; a single
//!   readers-writer lock lets any number of readers proceed together
//! - Use `ShardedUnorderedMap` under mixed read/write load from many
//!   threads; writers on different keys rarely share a lock
//! - Aggregate reads (`len`, `snapshot`) on the sharded map are
//!   point-in-time per shard, not globally atomic
//!
//! Both implement [`ConcurrentMap`], so load generators and test suites can
//! be written once and pointed at either:
//!
//! ```rust
//! use shardmap::{ConcurrentMap, ShardedUnorderedMap, UnorderedMap};
//!
//! fn fill<M: ConcurrentMap<Key = u64, Value = u64>>(map: &M) {
//!     for i in 0..100 {
//!         map.insert(i, i * i);
//!     }
//! }
//!
//! let coarse: UnorderedMap<u64, u64> = UnorderedMap::new();
//! let sharded: ShardedUnorderedMap<u64, u64> = ShardedUnorderedMap::new();
//! fill(&coarse);
//! fill(&sharded);
//! assert_eq!(coarse.len(), sharded.len());
//! ```

pub mod node;
pub mod sharded;
pub mod unsharded;

#[cfg(test)]
mod proptests;

pub use node::NodeHandle;
pub use sharded::ShardedUnorderedMap;
pub use unsharded::UnorderedMap;

use crate::Result;

/// Default number of shards for [`ShardedUnorderedMap`]
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// The operation surface shared by both map implementations
///
/// Generic code written against this trait runs unchanged on either map;
/// only construction and the sharded-only `shard_count` probe live outside
/// it. Lookups return clones, never references into locked storage, and
/// `insert` never overwrites an existing entry.
pub trait ConcurrentMap {
    /// The key type of the map
    type Key;
    /// The value type of the map
    type Value;

    /// Number of entries currently in the map
    fn len(&self) -> usize;

    /// Whether the map holds no entries
    fn is_empty(&self) -> bool;

    /// Theoretical upper bound on the number of entries the map could hold
    fn max_size(&self) -> usize;

    /// Copy of the value for `key`, or [`Error::KeyNotFound`](crate::Error::KeyNotFound)
    fn at(&self, key: &Self::Key) -> Result<Self::Value>;

    /// Copy of the value for `key`, or `None` when absent
    fn get(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Whether `key` is present
    fn contains_key(&self, key: &Self::Key) -> bool;

    /// Insert an entry if its key is absent; `true` iff it was inserted
    fn insert(&self, key: Self::Key, value: Self::Value) -> bool;

    /// Insert a batch of entries with `insert` semantics, returning how many
    /// were inserted
    fn insert_many<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (Self::Key, Self::Value)>;

    /// Insert the entry held by a node handle; empty handles are a no-op
    /// returning `false`
    fn insert_node(&self, node: NodeHandle<Self::Key, Self::Value>) -> bool;

    /// Remove `key`, returning its value if it was present
    fn remove(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Detach `key` and its value into a node handle; empty when absent
    fn extract(&self, key: &Self::Key) -> NodeHandle<Self::Key, Self::Value>;

    /// Remove all entries
    fn clear(&self);

    /// A freshly allocated snapshot of all entries, in unspecified order
    fn snapshot(&self) -> Vec<(Self::Key, Self::Value)>;
}
