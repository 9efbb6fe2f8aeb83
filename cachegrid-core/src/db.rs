use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::error::CacheResult;

/// The source of truth a cache sits in front of.
///
/// This is the one external collaborator the cache core never implements
/// for production use: a real deployment plugs in whatever backs its data
/// (a SQL database, a remote service, a file store). `Database` only needs a
/// plain `get`/`set` — the core does not assume anything about consistency,
/// transactions, or latency on the other side of it.
pub trait Database<K, V>: Send + Sync {
    fn get(&self, key: &K) -> CacheResult<Option<V>>;
    fn set(&self, key: &K, value: &V) -> CacheResult<()>;
}

/// An in-process stand-in for a real database.
///
/// Useful for tests and demos that need a [`Database`] without standing up
/// external infrastructure — it plays the role the reference implementation
/// gives to its `MockDB`.
#[derive(Debug)]
pub struct InMemoryDatabase<K, V> {
    data: Mutex<HashMap<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> InMemoryDatabase<K, V> {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    pub fn seeded(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            data: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Snapshot of everything currently stored, for test assertions.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.data.lock().clone()
    }
}

impl<K, V> Database<K, V> for InMemoryDatabase<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> CacheResult<Option<V>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &K, value: &V) -> CacheResult<()> {
        self.data.lock().insert(key.clone(), value.clone());
        Ok(())
    }
}
