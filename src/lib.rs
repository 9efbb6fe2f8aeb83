//! `cachegrid` is a distributed in-memory caching layer: per-node
//! concurrent caches with pluggable eviction (`LRU`, `LFU`) and write
//! (write-through, write-back) strategies, request coalescing so that a
//! stampede of concurrent misses on one key yields a single load, and a
//! consistent-hash ring that routes keys across a fleet of nodes.
//!
//! This crate is a thin facade over [`cachegrid_core`], which holds every
//! concrete type. Most applications only need what is re-exported here;
//! reach into `cachegrid_core` directly for the lower-level building blocks
//! (e.g. composing a [`CacheNode`] without going through a [`Router`]).
//!
//! ```no_run
//! use std::sync::Arc;
//! use cachegrid::{CacheNode, LruPolicy, Router};
//!
//! let node_a = Arc::new(CacheNode::<String, String>::new(1024, Box::new(LruPolicy::new()), None, None));
//! let node_b = Arc::new(CacheNode::<String, String>::new(1024, Box::new(LruPolicy::new()), None, None));
//! let router = Router::new(vec![node_a, node_b]);
//!
//! router.put("user:1".to_string(), "alice".to_string()).unwrap();
//! assert_eq!(router.get("user:1"), Some("alice".to_string()));
//! ```

pub use cachegrid_core::{
    hash_u128, CacheError, CacheGridConfig, CacheLoader, CacheNode, CacheResult, CacheWriter,
    ConsistentHashRing, Database, DatabaseLoader, EvictionPolicy, InMemoryDatabase, LfuPolicy,
    LruPolicy, NodeConfig, PolicyKind, RequestCoalescer, RingConfig, Router, WriteBackWriter,
    WriteThroughWriter, DEFAULT_REPLICAS,
};

pub mod telemetry {
    //! Re-exports [`cachegrid_core::telemetry`] for demo binaries. The
    //! library itself never calls this — only a `main()` should.
    pub use cachegrid_core::telemetry::init_demo_logging;
}
