//! Basic usage example for shardmap
//!
//! Walks through the core operations on both map types: lookups that fail
//! loudly instead of default-inserting, moving entries between maps through
//! node handles, sharded parallel writers, and the operation metrics.

use shardmap::{Error, MetricsCollector, ShardedUnorderedMap, UnorderedMap};
use std::sync::Arc;
use std::thread;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("ShardMap Usage Example");
    println!("======================");

    // Basic operations on the coarse-grained map
    println!("\n1. Basic Operations:");
    let map: UnorderedMap<String, u32> = UnorderedMap::new();
    map.insert("foo".to_string(), 1);
    map.insert("bar".to_string(), 2);

    let foo = map.at(&"foo".to_string())?;
    println!("   at(\"foo\") = {foo}");
    match map.at(&"missing".to_string()) {
        Err(Error::KeyNotFound) => println!("   at(\"missing\") fails with KeyNotFound"),
        other => println!("   unexpected result: {other:?}"),
    }
    println!("   len = {}", map.len());

    // Moving entries between maps without cloning the values
    println!("\n2. Node Migration:");
    let archive: ShardedUnorderedMap<String, u32> = ShardedUnorderedMap::with_shards(4);
    let node = map.extract(&"bar".to_string());
    println!(
        "   extracted ({:?}, {:?})",
        node.key().unwrap(),
        node.mapped().unwrap()
    );
    archive.insert_node(node);
    println!(
        "   source len = {}, archive len = {}",
        map.len(),
        archive.len()
    );

    // Parallel writers on the sharded map
    println!("\n3. Sharded Parallel Writers:");
    let shared: Arc<ShardedUnorderedMap<u64, u64>> = Arc::new(ShardedUnorderedMap::new());
    let writers: Vec<_> = (0..4u64)
        .map(|writer_id| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..10_000 {
                    shared.insert(writer_id * 10_000 + i, i);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    println!(
        "   {} entries across {} shards",
        shared.len(),
        shared.shard_count()
    );

    // Snapshot iteration and operation metrics
    println!("\n4. Snapshot and Metrics:");
    let sample: Vec<(u64, u64)> = shared.snapshot().into_iter().take(3).collect();
    println!("   snapshot sample: {sample:?}");

    let metrics = shared.metrics();
    println!(
        "   insertions = {}, rejected = {}, lookup hit rate = {:.1}%",
        metrics.insertions,
        metrics.rejected_insertions,
        metrics.lookup_hit_rate()
    );

    Ok(())
}
