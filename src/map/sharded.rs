//! Sharded concurrent unordered map.
//!
//! The same logical map as [`UnorderedMap`], partitioned over a fixed number
//! of independent shards. A key `k` lives in shard `hash(k) mod N`, where the
//! routing hash is a stable fx hash independent of the per-table hasher, and
//! `N` is fixed at construction. Per-key operations lock only their shard, so
//! writers on different keys usually proceed in parallel.
//!
//! ## Aggregate semantics
//!
//! `len`, `is_empty`, `snapshot`, `clear`, equality and metrics aggregation
//! visit the shards one at a time, holding at most one shard lock at any
//! moment. The results are point-in-time per shard, not a globally atomic
//! view. Reintroducing global atomicity (a shared counter, an all-shard lock
//! sweep) would reintroduce exactly the contention the sharding removes, so
//! the non-atomicity is part of the contract, not an implementation accident.

use crate::map::node::NodeHandle;
use crate::map::unsharded::UnorderedMap;
use crate::map::DEFAULT_SHARD_COUNT;
use crate::metrics::{MapMetrics, MetricsCollector};
use crate::util::CachePadded;
use crate::{ConcurrentMap, Result};
use core::hash::{BuildHasher, Hash};
use fxhash::FxBuildHasher;

/// A concurrent unordered map partitioned over independent shards
///
/// Each shard is an [`UnorderedMap`] with its own readers-writer lock. The
/// shard count defaults to 16 and never changes after construction.
///
/// # Type Parameters
///
/// * `K` - The key type, must implement `Hash + Eq`
/// * `V` - The value type, cloneable wherever an operation returns a copy
/// * `S` - The hasher builder for the shard tables, `FxBuildHasher` by default
///
/// # Examples
///
/// ```rust
/// use shardmap::ShardedUnorderedMap;
/// use std::sync::Arc;
/// use std::thread;
///
/// let map = Arc::new(ShardedUnorderedMap::with_shards(4));
///
/// let writers: Vec<_> = (0..4u64)
///     .map(|id| {
///         let map = Arc::clone(&map);
///         thread::spawn(move || {
///             for i in 0..100 {
///                 map.insert(id * 100 + i, id);
///             }
///         })
///     })
///     .collect();
/// for writer in writers {
///     writer.join().unwrap();
/// }
///
/// assert_eq!(map.len(), 400);
/// ```
#[derive(Debug)]
pub struct ShardedUnorderedMap<K, V, S = FxBuildHasher> {
    shards: Box<[CachePadded<UnorderedMap<K, V, S>>]>,
}

impl<K, V> ShardedUnorderedMap<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty map with the default shard count of 16
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::ShardedUnorderedMap;
    ///
    /// let map: ShardedUnorderedMap<String, u32> = ShardedUnorderedMap::new();
    /// assert_eq!(map.shard_count(), 16);
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARD_COUNT)
    }

    /// Create an empty map with `shard_count` shards
    ///
    /// # Panics
    ///
    /// Panics if `shard_count` is zero.
    pub fn with_shards(shard_count: usize) -> Self {
        Self::with_shards_and_hasher(shard_count, FxBuildHasher::default())
    }
}

impl<K, V, S> ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Create an empty map with `shard_count` shards using the given hasher
    /// builder for the shard tables
    ///
    /// # Panics
    ///
    /// Panics if `shard_count` is zero.
    pub fn with_shards_and_hasher(shard_count: usize, hasher: S) -> Self
    where
        S: Clone,
    {
        assert!(shard_count > 0, "Shard count must be greater than 0");
        let shards = (0..shard_count)
            .map(|_| CachePadded::new(UnorderedMap::with_hasher(hasher.clone())))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }

    /// The number of shards, fixed at construction
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    // Routing is a stable fx hash, independent of the shard tables' hasher,
    // so a key always resolves to the same shard of a given map.
    #[inline]
    fn shard_index(&self, key: &K) -> usize {
        (fxhash::hash64(key) % self.shards.len() as u64) as usize
    }

    #[inline]
    fn shard(&self, key: &K) -> &UnorderedMap<K, V, S> {
        &self.shards[self.shard_index(key)]
    }

    /// Total number of entries, summed shard by shard
    ///
    /// Each shard contributes under its own shared lock; the sum is
    /// point-in-time per shard, not globally atomic.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Whether the map holds no entries; short-circuits on the first
    /// non-empty shard
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Theoretical upper bound on the number of entries the map could hold
    pub fn max_size(&self) -> usize {
        self.shards[0].max_size()
    }

    /// A copy of the hasher builder used by the shard tables
    pub fn hasher(&self) -> S
    where
        S: Clone,
    {
        self.shards[0].hasher()
    }

    /// Look up `key` in its shard, returning a copy of its value
    ///
    /// Fails with [`Error::KeyNotFound`](crate::Error::KeyNotFound) when the
    /// key is absent; never default-inserts.
    pub fn at(&self, key: &K) -> Result<V>
    where
        V: Clone,
    {
        self.shard(key).at(key)
    }

    /// Look up `key` in its shard, returning a copy of its value if present
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.shard(key).get(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &K) -> bool {
        self.shard(key).contains_key(key)
    }

    /// Insert an entry into its shard if its key is absent
    ///
    /// # Returns
    ///
    /// `true` iff the key was absent and the entry was inserted. An existing
    /// entry is never overwritten.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::ShardedUnorderedMap;
    ///
    /// let map = ShardedUnorderedMap::new();
    /// assert!(map.insert("k", 1));
    /// assert!(!map.insert("k", 2));
    /// assert_eq!(map.get(&"k"), Some(1));
    /// ```
    pub fn insert(&self, key: K, value: V) -> bool {
        let index = self.shard_index(&key);
        self.shards[index].insert(key, value)
    }

    /// Insert a batch of entries, routing each to its shard
    ///
    /// Per-entry behavior matches [`insert`](Self::insert); only one shard
    /// lock is held at a time.
    ///
    /// # Returns
    ///
    /// The number of entries actually inserted.
    pub fn insert_many<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .map(|(key, value)| usize::from(self.insert(key, value)))
            .sum()
    }

    /// Insert the entry held by a detached node handle, routed by its key
    ///
    /// Because routing re-hashes the handle's key, a node extracted from one
    /// sharded map can be inserted into another with a different shard count.
    /// An empty handle is a no-op returning `false`.
    pub fn insert_node(&self, node: NodeHandle<K, V>) -> bool {
        let index = match node.key() {
            Some(key) => self.shard_index(key),
            None => return false,
        };
        self.shards[index].insert_node(node)
    }

    /// Remove `key` from its shard, returning its value if it was present
    pub fn remove(&self, key: &K) -> Option<V> {
        self.shard(key).remove(key)
    }

    /// Detach `key` and its value from its shard into a node handle
    pub fn extract(&self, key: &K) -> NodeHandle<K, V> {
        self.shard(key).extract(key)
    }

    /// Remove all entries, clearing each shard under its own exclusive lock
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    /// A freshly allocated snapshot of all entries, in unspecified order
    ///
    /// Concatenation of per-shard snapshots, each taken under that shard's
    /// shared lock. Entries inserted or removed while the snapshot is in
    /// progress may or may not appear, but every entry that does appear was
    /// present in its shard at the instant that shard was visited.
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let mut entries = Vec::new();
        for shard in self.shards.iter() {
            entries.extend(shard.snapshot());
        }
        entries
    }
}

impl<K, V, S> Default for ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        let shards = (0..DEFAULT_SHARD_COUNT)
            .map(|_| CachePadded::new(UnorderedMap::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }
}

impl<K, V, S> Clone for ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Copy the map shard by shard, holding one source shard lock at a time
    fn clone(&self) -> Self {
        let shards = self
            .shards
            .iter()
            .map(|shard| CachePadded::new(UnorderedMap::clone(shard)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }
}

impl<K, V, S> PartialEq for ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
{
    /// Two maps are equal iff they hold the same entries
    ///
    /// Lengths are compared first, then each shard of the left operand is
    /// snapshotted under its shared lock and the right operand probed per
    /// key. At most one shard lock is held at any time, so crossed
    /// comparisons cannot deadlock regardless of shard counts. Like all
    /// aggregates, the comparison is not atomic across shards under
    /// concurrent mutation.
    fn eq(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        for shard in self.shards.iter() {
            for (key, value) in shard.snapshot() {
                match other.get(&key) {
                    Some(other_value) if other_value == value => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl<K, V, S> Eq for ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    /// Collect entries into a fresh map with the default shard count; on
    /// duplicate keys the first wins, matching `insert` semantics
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = Self::default();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ShardedUnorderedMap<K, V>
where
    K: Eq + Hash,
{
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::ShardedUnorderedMap;
    ///
    /// let map = ShardedUnorderedMap::from([("foo", 1), ("bar", 2)]);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.at(&"foo"), Ok(1));
    /// ```
    fn from(entries: [(K, V); N]) -> Self {
        Self::from_iter(entries)
    }
}

impl<K, V, S> Extend<(K, V)> for ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Extend with `insert` semantics: present keys keep their values
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> ConcurrentMap for ShardedUnorderedMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        ShardedUnorderedMap::len(self)
    }

    fn is_empty(&self) -> bool {
        ShardedUnorderedMap::is_empty(self)
    }

    fn max_size(&self) -> usize {
        ShardedUnorderedMap::max_size(self)
    }

    fn at(&self, key: &K) -> Result<V> {
        ShardedUnorderedMap::at(self, key)
    }

    fn get(&self, key: &K) -> Option<V> {
        ShardedUnorderedMap::get(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        ShardedUnorderedMap::contains_key(self, key)
    }

    fn insert(&self, key: K, value: V) -> bool {
        ShardedUnorderedMap::insert(self, key, value)
    }

    fn insert_many<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        ShardedUnorderedMap::insert_many(self, entries)
    }

    fn insert_node(&self, node: NodeHandle<K, V>) -> bool {
        ShardedUnorderedMap::insert_node(self, node)
    }

    fn remove(&self, key: &K) -> Option<V> {
        ShardedUnorderedMap::remove(self, key)
    }

    fn extract(&self, key: &K) -> NodeHandle<K, V> {
        ShardedUnorderedMap::extract(self, key)
    }

    fn clear(&self) {
        ShardedUnorderedMap::clear(self)
    }

    fn snapshot(&self) -> Vec<(K, V)> {
        ShardedUnorderedMap::snapshot(self)
    }
}

impl<K, V, S> MetricsCollector for ShardedUnorderedMap<K, V, S> {
    /// Aggregate the per-shard counters into one snapshot
    fn metrics(&self) -> MapMetrics {
        let mut total = MapMetrics::default();
        for shard in self.shards.iter() {
            total.absorb(&shard.metrics());
        }
        total
    }

    fn reset_metrics(&self) {
        for shard in self.shards.iter() {
            shard.reset_metrics();
        }
    }
}
