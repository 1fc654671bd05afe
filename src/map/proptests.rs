//! Property-based tests for the map implementations.
//!
//! These drive both maps through arbitrary operation sequences and verify
//! that they agree with each other and with a sequential model.

use super::{ConcurrentMap, ShardedUnorderedMap, UnorderedMap};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u8, u16),
    Remove(u8),
    RoundTrip(u8),
}

fn op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        (any::<u8>(), any::<u16>()).prop_map(|(key, value)| MapOp::Insert(key, value)),
        any::<u8>().prop_map(MapOp::Remove),
        any::<u8>().prop_map(MapOp::RoundTrip),
    ]
}

fn apply<M: ConcurrentMap<Key = u8, Value = u16>>(map: &M, ops: &[MapOp]) {
    for op in ops {
        match *op {
            MapOp::Insert(key, value) => {
                map.insert(key, value);
            }
            MapOp::Remove(key) => {
                map.remove(&key);
            }
            MapOp::RoundTrip(key) => {
                let node = map.extract(&key);
                map.insert_node(node);
            }
        }
    }
}

fn sorted_snapshot<M: ConcurrentMap<Key = u8, Value = u16>>(map: &M) -> Vec<(u8, u16)> {
    let mut entries = map.snapshot();
    entries.sort_unstable();
    entries
}

proptest! {
    /// The sharded map is observationally equivalent to the coarse map for
    /// any operation sequence and any shard count.
    #[test]
    fn test_sharded_matches_unsharded(
        ops in prop::collection::vec(op_strategy(), 1..200),
        shard_count in 1usize..9,
    ) {
        let coarse: UnorderedMap<u8, u16> = UnorderedMap::new();
        let sharded: ShardedUnorderedMap<u8, u16> =
            ShardedUnorderedMap::with_shards(shard_count);

        apply(&coarse, &ops);
        apply(&sharded, &ops);

        prop_assert_eq!(coarse.len(), sharded.len());
        prop_assert_eq!(sorted_snapshot(&coarse), sorted_snapshot(&sharded));
    }

    /// Sequentially, the map behaves exactly like a reference model with
    /// insert-if-absent semantics.
    #[test]
    fn test_matches_sequential_model(ops in prop::collection::vec(op_strategy(), 1..300)) {
        let map: UnorderedMap<u8, u16> = UnorderedMap::new();
        let mut model: HashMap<u8, u16> = HashMap::new();

        for op in &ops {
            match *op {
                MapOp::Insert(key, value) => {
                    prop_assert_eq!(map.insert(key, value), !model.contains_key(&key));
                    model.entry(key).or_insert(value);
                }
                MapOp::Remove(key) => {
                    prop_assert_eq!(map.remove(&key), model.remove(&key));
                }
                MapOp::RoundTrip(key) => {
                    let node = map.extract(&key);
                    prop_assert_eq!(node.is_empty(), !model.contains_key(&key));
                    map.insert_node(node);
                }
            }
        }

        prop_assert_eq!(map.len(), model.len());
        for (key, value) in model {
            prop_assert_eq!(map.get(&key), Some(value));
        }
    }

    /// A first insert establishes the value; a second insert of the same key
    /// is rejected and leaves the value untouched.
    #[test]
    fn test_insert_is_monotonic(key in any::<u8>(), first in any::<u16>(), second in any::<u16>()) {
        let map: UnorderedMap<u8, u16> = UnorderedMap::new();
        prop_assert!(map.insert(key, first));
        prop_assert_eq!(map.at(&key), Ok(first));
        prop_assert!(!map.insert(key, second));
        prop_assert_eq!(map.at(&key), Ok(first));
    }

    /// Extract followed by reinserting the same node restores the map to its
    /// pre-extract state, whether or not the key was present.
    #[test]
    fn test_extract_insert_round_trips(
        entries in prop::collection::btree_map(any::<u8>(), any::<u16>(), 1..40),
        probe in any::<u8>(),
    ) {
        let map: ShardedUnorderedMap<u8, u16> = ShardedUnorderedMap::new();
        for (&key, &value) in &entries {
            map.insert(key, value);
        }
        let before = map.clone();

        let node = map.extract(&probe);
        prop_assert_eq!(node.is_empty(), !entries.contains_key(&probe));
        map.insert_node(node);

        prop_assert!(map == before);
    }

    /// Snapshots are owned copies: they keep describing the state the map
    /// had when they were taken, no matter what happens to the map later.
    #[test]
    fn test_snapshot_is_unaffected_by_later_mutation(
        ops in prop::collection::vec(op_strategy(), 1..100),
        later_ops in prop::collection::vec(op_strategy(), 1..100),
    ) {
        let map: ShardedUnorderedMap<u8, u16> = ShardedUnorderedMap::with_shards(4);
        let mut model: HashMap<u8, u16> = HashMap::new();
        for op in &ops {
            match *op {
                MapOp::Insert(key, value) => {
                    map.insert(key, value);
                    model.entry(key).or_insert(value);
                }
                MapOp::Remove(key) => {
                    map.remove(&key);
                    model.remove(&key);
                }
                MapOp::RoundTrip(key) => {
                    let node = map.extract(&key);
                    map.insert_node(node);
                }
            }
        }

        let snapshot = sorted_snapshot(&map);
        let mut expected: Vec<(u8, u16)> = model.into_iter().collect();
        expected.sort_unstable();

        apply(&map, &later_ops);
        map.clear();

        prop_assert_eq!(snapshot, expected);
        prop_assert!(map.is_empty());
    }

    /// No operation sequence can make a key occur twice.
    #[test]
    fn test_keys_stay_unique(ops in prop::collection::vec(op_strategy(), 1..300)) {
        let map: ShardedUnorderedMap<u8, u16> = ShardedUnorderedMap::with_shards(3);
        apply(&map, &ops);

        let entries = map.snapshot();
        let mut keys: Vec<u8> = entries.iter().map(|(key, _)| *key).collect();
        keys.sort_unstable();
        let total = keys.len();
        keys.dedup();
        prop_assert_eq!(keys.len(), total);
        prop_assert_eq!(total, map.len());
    }
}
