//! End-to-end demo of a small cachegrid cluster: three nodes with different
//! eviction/write strategies, a concurrent read/write stress run, a
//! consistency check after a write-back drain, a request-coalescing
//! stampede, and a graceful shutdown.
//!
//! Run with `RUST_LOG=info cargo run --example demo -p cachegrid-core`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cachegrid_core::{
    telemetry, CacheGridConfig, CacheLoader, CacheNode, CacheResult, CacheWriter, DatabaseLoader,
    EvictionPolicy, InMemoryDatabase, LfuPolicy, LruPolicy, PolicyKind, Router, WriteBackWriter,
    WriteThroughWriter,
};
use rand::Rng;

fn policy_for(kind: PolicyKind) -> Box<dyn EvictionPolicy<String>> {
    match kind {
        PolicyKind::Lru => Box::new(LruPolicy::new()),
        PolicyKind::Lfu => Box::new(LfuPolicy::new()),
    }
}

/// Simulates one client hammering the cluster with 80% reads / 20% writes
/// over a hot key range, for `duration`. Returns the number of operations
/// completed.
fn run_traffic(router: &Router<String>, duration: Duration) -> usize {
    let start = Instant::now();
    let mut ops = 0usize;
    let mut rng = rand::thread_rng();
    while start.elapsed() < duration {
        let key = format!("user:{}", rng.gen_range(1..=100));
        if rng.gen_bool(0.2) {
            let value = format!("Data-{}", rng.gen_range(1000..=9999));
            let _ = router.put(key, value);
        } else {
            let _ = router.get(&key);
        }
        ops += 1;
    }
    ops
}

fn main() {
    telemetry::init_demo_logging();

    println!("=== Initializing cachegrid cluster ===\n");

    // Layered config: in-code defaults, optionally overridden by
    // `cachegrid.toml` and `CACHEGRID_`-prefixed env vars. A missing file is
    // not an error, so this resolves to plain defaults unless the demo is
    // run alongside a config file.
    let config = CacheGridConfig::load("cachegrid.toml").expect("config layers should merge cleanly");
    println!(
        "Loaded config: node.capacity={} node.policy={:?} ring.replicas={}\n",
        config.node.capacity, config.node.policy, config.ring.replicas
    );

    let db = Arc::new(InMemoryDatabase::seeded([
        ("user:1".to_string(), "Alice".to_string()),
        ("user:2".to_string(), "Bob".to_string()),
    ]));

    // Node-0: config-driven policy + write-back (async drain on close).
    let node0: Arc<CacheNode<String, String>> = Arc::new(CacheNode::new(
        config.node.capacity,
        policy_for(config.node.policy),
        Some(Arc::new(DatabaseLoader::new(db.clone())) as Arc<dyn CacheLoader<String, String>>),
        Some(Arc::new(WriteBackWriter::new(db.clone())) as Arc<dyn CacheWriter<String, String>>),
    ));

    // Node-1: LFU + write-through (strong consistency, synchronous writes).
    let node1: Arc<CacheNode<String, String>> = Arc::new(CacheNode::new(
        10,
        Box::new(LfuPolicy::new()),
        Some(Arc::new(DatabaseLoader::new(db.clone())) as Arc<dyn CacheLoader<String, String>>),
        Some(Arc::new(WriteThroughWriter::new(db.clone())) as Arc<dyn CacheWriter<String, String>>),
    ));

    // Node-2: LRU, read-only (no writer configured at all).
    let node2: Arc<CacheNode<String, String>> = Arc::new(CacheNode::new(
        10,
        Box::new(LruPolicy::new()),
        Some(Arc::new(DatabaseLoader::new(db.clone())) as Arc<dyn CacheLoader<String, String>>),
        None,
    ));

    let router: Router<String> = Router::new(vec![node0, node1, node2]);

    println!("=== Starting stress run ===\n");
    let num_clients = 5;
    let total_ops: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..num_clients)
            .map(|_| scope.spawn(|| run_traffic(&router, Duration::from_secs(2))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });
    println!("Stress run complete: {total_ops} ops across {num_clients} clients in ~2s\n");

    println!("=== Verifying consistency after a write-back drain ===\n");
    let test_key = "user:1".to_string();
    router.put(test_key.clone(), "UPDATED_ALICE".to_string()).unwrap();
    router.close().expect("writer close should not fail in this demo");
    println!(
        "Read {test_key}: {:?} (expected Some(\"UPDATED_ALICE\"))\n",
        db.get(&test_key).unwrap()
    );

    println!("=== Verifying request coalescing ===\n");
    let stampede_key = "user:999".to_string();
    db.set(&stampede_key, &"Hidden-Treasure".to_string()).unwrap();

    struct CountingLoader {
        db: Arc<InMemoryDatabase<String, String>>,
        calls: Arc<AtomicUsize>,
    }
    impl CacheLoader<String, String> for CountingLoader {
        fn load(&self, key: &String) -> CacheResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            println!("[loader] fetching {key}");
            thread::sleep(Duration::from_millis(50));
            self.db.get(key)
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let stampede_node: Arc<CacheNode<String, String>> = Arc::new(CacheNode::new(
        16,
        Box::new(LruPolicy::new()),
        Some(Arc::new(CountingLoader {
            db: db.clone(),
            calls: calls.clone(),
        }) as Arc<dyn CacheLoader<String, String>>),
        None,
    ));

    println!("Launching 5 threads to fetch {stampede_key} simultaneously...");
    thread::scope(|scope| {
        for _ in 0..5 {
            let node = stampede_node.clone();
            let key = stampede_key.clone();
            scope.spawn(move || node.get(&key));
        }
    });
    println!(
        "Loader was called {} time(s) for {} concurrent followers (expected 1).\n",
        calls.load(Ordering::SeqCst),
        5
    );

    println!("=== System shutdown complete ===");
}
