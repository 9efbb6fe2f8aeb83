//! Core engine for a distributed in-memory cache: per-node concurrent
//! caches with pluggable eviction and write strategies, request coalescing,
//! an asynchronous write-back pipeline with graceful drain, and a
//! consistent-hash ring for routing keys across a fleet of nodes.
//!
//! Networking and the database itself are deliberately out of scope — this
//! crate specifies only the in-process semantics a node and a ring of nodes
//! must honor. See [`Router`] for the entry point tying nodes to the ring.

pub mod coalescer;
pub mod config;
pub mod db;
pub mod error;
pub mod eviction;
pub mod hash;
pub mod loader;
pub mod node;
pub mod ring;
pub mod router;
pub mod telemetry;
pub mod writer;

pub use coalescer::RequestCoalescer;
pub use config::{CacheGridConfig, NodeConfig, PolicyKind, RingConfig};
pub use db::{Database, InMemoryDatabase};
pub use error::{CacheError, CacheResult};
pub use eviction::{EvictionPolicy, LfuPolicy, LruPolicy};
pub use hash::hash_u128;
pub use loader::{CacheLoader, DatabaseLoader};
pub use node::CacheNode;
pub use ring::{ConsistentHashRing, DEFAULT_REPLICAS};
pub use router::Router;
pub use writer::{CacheWriter, WriteBackWriter, WriteThroughWriter};
