//! Coarse-grained concurrent unordered map.
//!
//! One hash table behind one readers-writer lock. Readers (`at`, `get`,
//! `contains_key`, `len`, `snapshot`, equality, clone-as-source) share the
//! lock; mutators (`insert*`, `remove`, `extract`, `clear`) hold it
//! exclusively. Every operation appears atomic at the point its lock is
//! acquired, and no operation returns while still holding the lock.
//!
//! ## Design
//!
//! - Readers return *clones* of stored values, never references into the
//!   table. A reference would have to outlive the lock guard.
//! - `insert` never overwrites: inserting a key that is already present is
//!   rejected and reported as `false`. Replacement is spelled
//!   `remove` + `insert` (or `extract` + `insert_node`) so that a reader
//!   holding an old copy is never surprised by silent mutation.
//! - `at` fails with [`Error::KeyNotFound`] rather than default-inserting.
//!   Default-insertion would turn a read pattern into a write pattern and
//!   invalidate reader-contention assumptions.
//! - Equality locks both operands shared, acquired in address order.

use crate::map::node::NodeHandle;
use crate::metrics::{AtomicMapMetrics, MapMetrics, MetricsCollector};
use crate::{ConcurrentMap, Error, Result};
use core::hash::{BuildHasher, Hash};
use core::mem;
use fxhash::FxBuildHasher;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::RwLock;

/// A thread-safe unordered map with one readers-writer lock
///
/// All operations take `&self`; share the map with `Arc` or scoped threads.
///
/// # Type Parameters
///
/// * `K` - The key type, must implement `Hash + Eq`
/// * `V` - The value type, cloneable wherever an operation returns a copy
/// * `S` - The hasher builder for the underlying table, `FxBuildHasher` by default
///
/// # Examples
///
/// ```rust
/// use shardmap::UnorderedMap;
///
/// let map: UnorderedMap<i32, String> = UnorderedMap::new();
/// assert!(map.insert(1, "hello".to_string()));
/// assert_eq!(map.get(&1), Some("hello".to_string()));
/// ```
#[derive(Debug)]
pub struct UnorderedMap<K, V, S = FxBuildHasher> {
    table: RwLock<HashMap<K, V, S>>,
    metrics: AtomicMapMetrics,
}

impl<K, V> UnorderedMap<K, V>
where
    K: Eq + Hash,
{
    /// Create a new, empty map
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::UnorderedMap;
    ///
    /// let map: UnorderedMap<i32, String> = UnorderedMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }

    /// Create a new, empty map with room for at least `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                FxBuildHasher::default(),
            )),
            metrics: AtomicMapMetrics::default(),
        }
    }
}

impl<K, V, S> UnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Create a new, empty map using the given hasher builder
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: RwLock::new(HashMap::with_hasher(hasher)),
            metrics: AtomicMapMetrics::default(),
        }
    }

    /// Number of entries currently in the map
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether the map holds no entries
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Theoretical upper bound on the number of entries the map could hold
    pub fn max_size(&self) -> usize {
        isize::MAX as usize / mem::size_of::<(K, V)>().max(1)
    }

    /// A copy of the underlying hasher builder
    pub fn hasher(&self) -> S
    where
        S: Clone,
    {
        self.table.read().hasher().clone()
    }

    /// Look up `key`, returning a copy of its value
    ///
    /// Fails with [`Error::KeyNotFound`] when the key is absent. This is the
    /// indexing accessor: there is deliberately no variant that
    /// default-inserts on a miss.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::UnorderedMap;
    ///
    /// let map: UnorderedMap<&str, u32> = UnorderedMap::new();
    /// map.insert("one", 1);
    /// assert_eq!(map.at(&"one"), Ok(1));
    /// assert!(map.at(&"two").is_err());
    /// ```
    pub fn at(&self, key: &K) -> Result<V>
    where
        V: Clone,
    {
        let table = self.table.read();
        let value = table.get(key).cloned();
        self.metrics.record_lookup(value.is_some());
        value.ok_or(Error::KeyNotFound)
    }

    /// Look up `key`, returning a copy of its value if present
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let table = self.table.read();
        let value = table.get(key).cloned();
        self.metrics.record_lookup(value.is_some());
        value
    }

    /// Whether `key` is present in the map
    pub fn contains_key(&self, key: &K) -> bool {
        let hit = self.table.read().contains_key(key);
        self.metrics.record_lookup(hit);
        hit
    }

    /// Insert an entry if its key is absent
    ///
    /// # Returns
    ///
    /// `true` iff the key was absent and the entry was inserted. An existing
    /// entry is never overwritten.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::UnorderedMap;
    ///
    /// let map: UnorderedMap<&str, u32> = UnorderedMap::new();
    /// assert!(map.insert("k", 1));
    /// assert!(!map.insert("k", 2));
    /// assert_eq!(map.get(&"k"), Some(1));
    /// ```
    pub fn insert(&self, key: K, value: V) -> bool {
        let mut table = self.table.write();
        let inserted = match table.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        };
        self.metrics.record_insert(inserted);
        inserted
    }

    /// Insert a batch of entries under one exclusive acquisition
    ///
    /// Each entry follows [`insert`](Self::insert) semantics; on duplicate
    /// keys within the batch, the first entry wins.
    ///
    /// # Returns
    ///
    /// The number of entries actually inserted.
    pub fn insert_many<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut table = self.table.write();
        let mut inserted = 0;
        for (key, value) in entries {
            match table.entry(key) {
                Entry::Occupied(_) => self.metrics.record_insert(false),
                Entry::Vacant(slot) => {
                    slot.insert(value);
                    self.metrics.record_insert(true);
                    inserted += 1;
                }
            }
        }
        inserted
    }

    /// Insert the entry held by a detached node handle
    ///
    /// An empty handle is a no-op returning `false`; otherwise this behaves
    /// exactly like [`insert`](Self::insert) with the handle's entry. The
    /// handle is consumed either way.
    pub fn insert_node(&self, node: NodeHandle<K, V>) -> bool {
        match node.into_entry() {
            Some((key, value)) => self.insert(key, value),
            None => false,
        }
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut table = self.table.write();
        let value = table.remove(key);
        self.metrics.record_removal(value.is_some());
        value
    }

    /// Detach `key` and its value into a node handle
    ///
    /// Returns an occupied handle owning the entry, or an empty handle when
    /// the key is absent. The entry itself is moved, not cloned, so
    /// `extract` + `insert_node` round-trips without reallocating the value.
    pub fn extract(&self, key: &K) -> NodeHandle<K, V> {
        let mut table = self.table.write();
        match table.remove_entry(key) {
            Some((key, value)) => {
                self.metrics.record_removal(true);
                NodeHandle::occupied(key, value)
            }
            None => {
                self.metrics.record_removal(false);
                NodeHandle::default()
            }
        }
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.table.write().clear();
    }

    /// A freshly allocated snapshot of all entries, in unspecified order
    ///
    /// The snapshot is taken under the shared lock and owned by the caller;
    /// later mutations of the map do not affect it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::UnorderedMap;
    ///
    /// let map: UnorderedMap<&str, u32> = UnorderedMap::new();
    /// map.insert("k", 1);
    ///
    /// let snapshot = map.snapshot();
    /// map.clear();
    /// assert_eq!(snapshot, vec![("k", 1)]);
    /// ```
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let table = self.table.read();
        table
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K, V, S> Default for UnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Clone for UnorderedMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Copy the map under a shared lock on the source
    ///
    /// The copy starts with fresh metrics.
    fn clone(&self) -> Self {
        let table = self.table.read().clone();
        Self {
            table: RwLock::new(table),
            metrics: AtomicMapMetrics::default(),
        }
    }
}

impl<K, V, S> PartialEq for UnorderedMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Two maps are equal iff they hold the same entries
    ///
    /// Both tables are locked shared for the comparison, acquired in address
    /// order so crossed `a == b` / `b == a` races cannot deadlock.
    fn eq(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        let (first, second) = if (self as *const Self as usize) < (other as *const Self as usize) {
            (self, other)
        } else {
            (other, self)
        };
        let first_table = first.table.read();
        let second_table = second.table.read();
        *first_table == *second_table
    }
}

impl<K, V, S> Eq for UnorderedMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for UnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    /// Collect entries into a fresh map; on duplicate keys the first wins,
    /// matching `insert` semantics
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = HashMap::with_hasher(S::default());
        for (key, value) in iter {
            table.entry(key).or_insert(value);
        }
        Self {
            table: RwLock::new(table),
            metrics: AtomicMapMetrics::default(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for UnorderedMap<K, V>
where
    K: Eq + Hash,
{
    /// # Examples
    ///
    /// ```rust
    /// use shardmap::UnorderedMap;
    ///
    /// let map = UnorderedMap::from([("foo", 1), ("bar", 2)]);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.at(&"foo"), Ok(1));
    /// ```
    fn from(entries: [(K, V); N]) -> Self {
        Self::from_iter(entries)
    }
}

impl<K, V, S> Extend<(K, V)> for UnorderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Extend with `insert` semantics: present keys keep their values
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let table = self.table.get_mut();
        for (key, value) in iter {
            table.entry(key).or_insert(value);
        }
    }
}

impl<K, V, S> ConcurrentMap for UnorderedMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        UnorderedMap::len(self)
    }

    fn is_empty(&self) -> bool {
        UnorderedMap::is_empty(self)
    }

    fn max_size(&self) -> usize {
        UnorderedMap::max_size(self)
    }

    fn at(&self, key: &K) -> Result<V> {
        UnorderedMap::at(self, key)
    }

    fn get(&self, key: &K) -> Option<V> {
        UnorderedMap::get(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        UnorderedMap::contains_key(self, key)
    }

    fn insert(&self, key: K, value: V) -> bool {
        UnorderedMap::insert(self, key, value)
    }

    fn insert_many<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        UnorderedMap::insert_many(self, entries)
    }

    fn insert_node(&self, node: NodeHandle<K, V>) -> bool {
        UnorderedMap::insert_node(self, node)
    }

    fn remove(&self, key: &K) -> Option<V> {
        UnorderedMap::remove(self, key)
    }

    fn extract(&self, key: &K) -> NodeHandle<K, V> {
        UnorderedMap::extract(self, key)
    }

    fn clear(&self) {
        UnorderedMap::clear(self)
    }

    fn snapshot(&self) -> Vec<(K, V)> {
        UnorderedMap::snapshot(self)
    }
}

impl<K, V, S> MetricsCollector for UnorderedMap<K, V, S> {
    fn metrics(&self) -> MapMetrics {
        self.metrics.snapshot()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }
}
