use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use tracing::{error, info};

use crate::db::Database;
use crate::error::{CacheError, CacheResult};

/// Capability contract for persisting mutations to the source of truth.
pub trait CacheWriter<K, V>: Send + Sync {
    fn write(&self, key: K, value: V) -> CacheResult<()>;
    fn delete(&self, key: K) -> CacheResult<()>;
    /// Releases any background resources. A no-op for synchronous writers;
    /// drains and joins the worker thread for write-back writers.
    fn close(&self) -> CacheResult<()>;
}

/// Writes synchronously to the source of truth before returning.
///
/// Strong consistency, higher latency: if the underlying store rejects the
/// write, the error propagates to the caller of `put` and the in-memory
/// cache is never updated (see [`CacheNode::put`](crate::CacheNode::put)).
pub struct WriteThroughWriter<K, V, D> {
    db: Arc<D>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, D: Database<K, V>> WriteThroughWriter<K, V, D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }
}

impl<K, V, D> CacheWriter<K, V> for WriteThroughWriter<K, V, D>
where
    K: Send + Sync,
    V: Send + Sync,
    D: Database<K, V>,
{
    fn write(&self, key: K, value: V) -> CacheResult<()> {
        self.db.set(&key, &value)
    }

    fn delete(&self, _key: K) -> CacheResult<()> {
        Ok(())
    }

    fn close(&self) -> CacheResult<()> {
        Ok(())
    }
}

enum WriteOrder<K, V> {
    Write(K, V),
    Shutdown,
}

/// Persists mutations on a dedicated background worker.
///
/// `write` enqueues and returns immediately; a single worker thread drains
/// the queue in order and performs the underlying store writes. Store
/// failures are logged and never surfaced to `write` callers — this is an
/// explicit eventual-consistency concession (see
/// [`CacheError::WriteBackFailed`]). `close()` enqueues a shutdown sentinel
/// and joins the worker, which only exits after observing it, guaranteeing
/// every write accepted before `close()` has been delivered.
pub struct WriteBackWriter<K, V> {
    sender: Sender<WriteOrder<K, V>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> WriteBackWriter<K, V>
where
    K: Send + Sync + std::fmt::Debug + 'static,
    V: Send + Sync + 'static,
{
    pub fn new<D>(db: Arc<D>) -> Self
    where
        D: Database<K, V> + Send + Sync + 'static,
    {
        let (sender, receiver) = unbounded::<WriteOrder<K, V>>();
        let worker = thread::Builder::new()
            .name("cachegrid-writeback".into())
            .spawn(move || {
                for order in receiver.iter() {
                    match order {
                        WriteOrder::Write(key, value) => {
                            if let Err(err) = db.set(&key, &value) {
                                error!(?key, %err, "write-back store failed, continuing with next order");
                            }
                        }
                        WriteOrder::Shutdown => break,
                    }
                }
                info!("write-back worker drained its queue and is exiting");
            })
            .expect("failed to spawn write-back worker thread");

        Self {
            sender,
            worker: Mutex::new(Some(worker)),
        }
    }
}

impl<K, V> CacheWriter<K, V> for WriteBackWriter<K, V>
where
    K: Send + Sync + std::fmt::Debug,
    V: Send + Sync,
{
    fn write(&self, key: K, value: V) -> CacheResult<()> {
        self.sender
            .send(WriteOrder::Write(key, value))
            .map_err(|_| CacheError::WriterClosed)
    }

    fn delete(&self, _key: K) -> CacheResult<()> {
        Ok(())
    }

    fn close(&self) -> CacheResult<()> {
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            info!("write-back writer draining queue before shutdown");
            // A closed channel (no Sender left other than this one, which we
            // are about to drop with it) is fine: the worker has no other way
            // to observe shutdown, so if send fails the worker is already gone.
            let _ = self.sender.send(WriteOrder::Shutdown);
            handle.join().map_err(|_| CacheError::WriteBackFailed {
                key: "<shutdown>".to_string(),
                reason: "write-back worker thread panicked".to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryDatabase;
    use std::time::Duration;

    #[test]
    fn write_through_propagates_store_result() {
        let db = Arc::new(InMemoryDatabase::new());
        let writer = WriteThroughWriter::new(db.clone());
        writer.write("k".to_string(), "v".to_string()).unwrap();
        assert_eq!(db.get(&"k".to_string()).unwrap(), Some("v".to_string()));
    }

    #[test]
    fn write_back_drains_before_close_returns() {
        let db = Arc::new(InMemoryDatabase::new());
        let writer: WriteBackWriter<String, String> = WriteBackWriter::new(db.clone());

        for i in 0..100 {
            writer
                .write(format!("key-{i}"), format!("value-{i}"))
                .unwrap();
        }
        writer.close().unwrap();

        for i in 0..100 {
            assert_eq!(
                db.get(&format!("key-{i}")).unwrap(),
                Some(format!("value-{i}"))
            );
        }
    }

    #[test]
    fn write_back_close_is_idempotent() {
        let db = Arc::new(InMemoryDatabase::<String, String>::new());
        let writer: WriteBackWriter<String, String> = WriteBackWriter::new(db);
        writer.close().unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn write_after_close_is_reported_not_undefined() {
        let db = Arc::new(InMemoryDatabase::<String, String>::new());
        let writer: WriteBackWriter<String, String> = WriteBackWriter::new(db);
        writer.close().unwrap();
        // give the worker's channel time to fully drop on the other end
        thread::sleep(Duration::from_millis(10));
        let result = writer.write("k".to_string(), "v".to_string());
        assert!(result.is_err());
    }
}
