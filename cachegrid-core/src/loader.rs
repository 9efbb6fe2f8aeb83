use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::db::Database;
use crate::error::CacheResult;

/// Read-through collaborator to the source of truth.
///
/// Absence is a legitimate, non-error outcome (`Ok(None)`): only reserve
/// `Err` for genuine failure to reach or interpret the source.
pub trait CacheLoader<K, V>: Send + Sync {
    fn load(&self, key: &K) -> CacheResult<Option<V>>;
}

/// The default [`CacheLoader`]: reads straight through to a [`Database`].
pub struct DatabaseLoader<K, V, D> {
    db: Arc<D>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, D: Database<K, V>> DatabaseLoader<K, V, D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }
}

impl<K, V, D> CacheLoader<K, V> for DatabaseLoader<K, V, D>
where
    K: Send + Sync,
    V: Send + Sync,
    D: Database<K, V>,
{
    fn load(&self, key: &K) -> CacheResult<Option<V>> {
        debug!("loading from source of truth");
        self.db.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryDatabase;

    #[test]
    fn loader_delegates_to_database() {
        let db = Arc::new(InMemoryDatabase::seeded([("k".to_string(), "v".to_string())]));
        let loader = DatabaseLoader::new(db);
        assert_eq!(loader.load(&"k".to_string()).unwrap(), Some("v".to_string()));
        assert_eq!(loader.load(&"missing".to_string()).unwrap(), None);
    }
}
