use thiserror::Error;

/// Result type alias for cachegrid operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Unified error type for the cache core.
///
/// Every variant maps to one of the failure modes a [`CacheNode`](crate::CacheNode)
/// or [`ConsistentHashRing`](crate::ConsistentHashRing) can raise. Errors carry
/// owned `String` context (rather than boxed sources) so that a single
/// instance can be cloned and delivered to every waiter of a coalesced call —
/// see [`RequestCoalescer`](crate::RequestCoalescer).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The loader could not reach or interpret the source of truth.
    #[error("load failed for key {key}: {reason}")]
    LoadFailed { key: String, reason: String },

    /// The write-through store rejected a synchronous write.
    #[error("write failed for key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    /// A write-back worker's store call failed. Never propagated to the
    /// `write` caller; logged and the worker continues.
    #[error("write-back store failed for key {key}: {reason}")]
    WriteBackFailed { key: String, reason: String },

    /// `write`/`delete` was called on a write-back writer after `close()`
    /// had already drained and joined the worker.
    #[error("writer is closed")]
    WriterClosed,

    /// The router's ring has no nodes to route to.
    #[error("no nodes available in router")]
    NoNodesAvailable,

    /// `evict()` returned `None` while storage was at capacity. A correct
    /// policy can never reach this state; it indicates a policy/storage
    /// bookkeeping bug.
    #[error("capacity invariant violated for key {key}")]
    CapacityInvariantViolated { key: String },
}
