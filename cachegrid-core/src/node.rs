use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::coalescer::RequestCoalescer;
use crate::error::{CacheError, CacheResult};
use crate::eviction::EvictionPolicy;
use crate::loader::CacheLoader;
use crate::writer::CacheWriter;

struct NodeState<K, V> {
    storage: HashMap<K, V>,
    policy: Box<dyn EvictionPolicy<K>>,
}

/// A self-contained cache unit: storage, an eviction policy, and optional
/// read-through/write-through(-back) collaborators.
///
/// `get` and `put` are the only entry points; everything else (coalescing
/// loads, evicting on overflow, delegating to the writer) is internal. A
/// node never talks to another node — that is the [`Router`](crate)'s job.
pub struct CacheNode<K, V> {
    capacity: usize,
    state: Mutex<NodeState<K, V>>,
    loader: Option<Arc<dyn CacheLoader<K, V>>>,
    writer: Option<Arc<dyn CacheWriter<K, V>>>,
    coalescer: RequestCoalescer<K, Option<V>>,
}

impl<K, V> CacheNode<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(
        capacity: usize,
        policy: Box<dyn EvictionPolicy<K>>,
        loader: Option<Arc<dyn CacheLoader<K, V>>>,
        writer: Option<Arc<dyn CacheWriter<K, V>>>,
    ) -> Self {
        assert!(capacity >= 1, "CacheNode capacity must be at least 1");
        Self {
            capacity,
            state: Mutex::new(NodeState {
                storage: HashMap::new(),
                policy,
            }),
            loader,
            writer,
            coalescer: RequestCoalescer::new(),
        }
    }

    /// Reads `key`, read-through-loading it on a miss if a loader is
    /// configured. A load failure degrades to `None` at this boundary
    /// (after being logged) — use [`try_get`](Self::try_get) to observe the
    /// error itself.
    pub fn get(&self, key: &K) -> Option<V> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(err) => {
                error!(?key, %err, "get degraded to a miss after a load error");
                None
            }
        }
    }

    /// Like [`get`](Self::get), but surfaces `CacheError::LoadFailed`
    /// instead of swallowing it.
    pub fn try_get(&self, key: &K) -> CacheResult<Option<V>> {
        {
            let mut state = self.state.lock();
            if let Some(value) = state.storage.get(key).cloned() {
                state.policy.on_access(key);
                debug!(?key, "cache hit");
                return Ok(Some(value));
            }
        }
        // The node mutex is released above before we ever touch the
        // coalescer: two followers on the same key must never contend for
        // this node's lock while waiting on each other's load.
        debug!(?key, "cache miss");

        let Some(loader) = self.loader.as_ref() else {
            return Ok(None);
        };

        self.coalescer.do_call(key.clone(), || match loader.load(key)? {
            Some(value) => {
                self.insert(key.clone(), value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        })
    }

    /// Writes `value` for `key`, delegating to the configured writer first
    /// (synchronously for write-through; fire-and-forget for write-back)
    /// before updating in-memory storage. If the writer raises, storage is
    /// left untouched and the error propagates.
    pub fn put(&self, key: K, value: V) -> CacheResult<()> {
        let mut state = self.state.lock();
        if let Some(writer) = self.writer.as_ref() {
            writer.write(key.clone(), value.clone())?;
        }
        Self::insert_locked(&mut state, self.capacity, key, value);
        Ok(())
    }

    /// Closes this node's writer, if any. Called by
    /// [`Router::close`](crate) during shutdown fan-out.
    pub fn close_writer(&self) -> CacheResult<()> {
        match self.writer.as_ref() {
            Some(writer) => writer.close(),
            None => Ok(()),
        }
    }

    /// Number of keys currently resident. Never exceeds `capacity`.
    pub fn len(&self) -> usize {
        self.state.lock().storage.len()
    }

    /// Whether the node currently holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, key: K, value: V) {
        let mut state = self.state.lock();
        Self::insert_locked(&mut state, self.capacity, key, value);
    }

    fn insert_locked(state: &mut NodeState<K, V>, capacity: usize, key: K, value: V) {
        if !state.storage.contains_key(&key) && state.storage.len() >= capacity {
            match state.policy.evict() {
                Some(victim) => {
                    state.storage.remove(&victim);
                }
                None => {
                    let err = CacheError::CapacityInvariantViolated {
                        key: format!("{key:?}"),
                    };
                    error!(%err, "policy/storage bookkeeping bug");
                    panic!("{err}");
                }
            }
        }
        state.policy.on_access(&key);
        state.storage.insert(key, value);
    }

    #[cfg(test)]
    fn contains(&self, key: &K) -> bool {
        self.state.lock().storage.contains_key(key)
    }
}
