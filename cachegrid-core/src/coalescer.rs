use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::CacheError;

enum Outcome<V> {
    Pending,
    Value(V),
    Error(CacheError),
}

struct CallRecord<V> {
    state: Mutex<Outcome<V>>,
    done: Condvar,
}

/// Deduplicates in-flight loads per key (a "singleflight").
///
/// When a stampede of concurrent misses lands on the same key, only the
/// first caller — the leader — actually runs the supplied thunk. Every
/// other caller that arrives while that call is in flight — a follower —
/// blocks on the leader's completion and observes the exact same outcome,
/// value or error, rather than issuing its own redundant call.
///
/// The in-flight call record is removed from the map as soon as the leader
/// publishes its outcome; each follower holds its own `Arc` clone of the
/// record by then, so no unbounded history of past calls accumulates.
pub struct RequestCoalescer<K, V> {
    inflight: Mutex<HashMap<K, Arc<CallRecord<V>>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> Default for RequestCoalescer<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> RequestCoalescer<K, V> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `thunk` at most once per in-flight window for `key`.
    ///
    /// The leader runs `thunk` with the coalescer's own lock released (the
    /// lock only ever guards installing and removing the call record, never
    /// the call itself). Followers wait on the record's latch; by the time
    /// their wait returns, the result or error is already published.
    pub fn do_call(
        &self,
        key: K,
        thunk: impl FnOnce() -> Result<V, CacheError>,
    ) -> Result<V, CacheError> {
        let (record, is_leader) = {
            let mut inflight = self.inflight.lock();
            if let Some(existing) = inflight.get(&key) {
                (existing.clone(), false)
            } else {
                let record = Arc::new(CallRecord {
                    state: Mutex::new(Outcome::Pending),
                    done: Condvar::new(),
                });
                inflight.insert(key.clone(), record.clone());
                (record, true)
            }
        };

        if !is_leader {
            let mut state = record.state.lock();
            while matches!(*state, Outcome::Pending) {
                record.done.wait(&mut state);
            }
            return match &*state {
                Outcome::Value(value) => Ok(value.clone()),
                Outcome::Error(err) => Err(err.clone()),
                Outcome::Pending => unreachable!("wait only returns once state is published"),
            };
        }

        let outcome = thunk();
        {
            let mut state = record.state.lock();
            *state = match &outcome {
                Ok(value) => Outcome::Value(value.clone()),
                Err(err) => Outcome::Error(err.clone()),
            };
        }
        record.done.notify_all();

        self.inflight.lock().remove(&key);

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_caller_gets_the_value() {
        let coalescer: RequestCoalescer<String, i32> = RequestCoalescer::new();
        let result = coalescer.do_call("k".to_string(), || Ok(42));
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn later_calls_after_completion_start_fresh() {
        let coalescer: RequestCoalescer<String, i32> = RequestCoalescer::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            coalescer
                .do_call("k".to_string(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn concurrent_misses_collapse_into_one_call() {
        let coalescer = Arc::new(RequestCoalescer::<String, String>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(10));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let coalescer = coalescer.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    coalescer.do_call("x".to_string(), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Ok("v".to_string())
                    })
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result, Ok("v".to_string()));
        }
    }

    #[test]
    fn error_is_delivered_to_every_waiter() {
        let coalescer = Arc::new(RequestCoalescer::<String, i32>::new());
        let barrier = Arc::new(Barrier::new(5));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let coalescer = coalescer.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    coalescer.do_call("x".to_string(), || {
                        thread::sleep(Duration::from_millis(20));
                        Err(CacheError::LoadFailed {
                            key: "x".to_string(),
                            reason: "boom".to_string(),
                        })
                    })
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().unwrap();
            assert!(result.is_err());
        }
    }
}
