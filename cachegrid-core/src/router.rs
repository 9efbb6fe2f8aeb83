use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::error::{CacheError, CacheResult};
use crate::node::CacheNode;
use crate::ring::ConsistentHashRing;

/// Routes string keys across a fleet of [`CacheNode`]s via a
/// [`ConsistentHashRing`].
///
/// Node keys are fixed to `String` here: the ring hashes the routing key
/// directly, so the node a `Router` dispatches to must be keyed the same
/// way. Nothing below the router cares — `CacheNode` stays generic over any
/// hashable key for callers that don't need distribution across a ring.
///
/// Topology changes (`add_node`/`remove_node`) and lookups both take the
/// ring's lock; lookups take it for read only, so routing never blocks on
/// other routing, only on a concurrent topology change.
pub struct Router<V> {
    nodes: RwLock<HashMap<String, Arc<CacheNode<String, V>>>>,
    labels: RwLock<Vec<String>>,
    ring: RwLock<ConsistentHashRing>,
}

impl<V> Router<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Builds a router from nodes labeled `Node-0`, `Node-1`, ... in
    /// insertion order, for deterministic startup topology.
    pub fn new(nodes: Vec<Arc<CacheNode<String, V>>>) -> Self {
        let labeled = nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| (format!("Node-{i}"), node))
            .collect();
        Self::with_labels(labeled)
    }

    /// Builds a router from explicitly labeled nodes.
    pub fn with_labels(labeled_nodes: Vec<(String, Arc<CacheNode<String, V>>)>) -> Self {
        let labels: Vec<String> = labeled_nodes.iter().map(|(label, _)| label.clone()).collect();
        let nodes: HashMap<String, Arc<CacheNode<String, V>>> =
            labeled_nodes.into_iter().collect();
        let ring = ConsistentHashRing::new(labels.clone(), crate::ring::DEFAULT_REPLICAS);
        Self {
            nodes: RwLock::new(nodes),
            labels: RwLock::new(labels),
            ring: RwLock::new(ring),
        }
    }

    /// Reads through the ring to whichever node currently owns `key`.
    /// Returns `None` if the ring has no nodes, after logging a warning.
    pub fn get(&self, key: &str) -> Option<V> {
        let label = {
            let ring = self.ring.read();
            ring.get_node(key)
        };
        let Some(label) = label else {
            warn!(key, "router has no nodes available for get");
            return None;
        };
        let node = self.nodes.read().get(&label).cloned();
        match node {
            Some(node) => node.get(&key.to_string()),
            None => {
                error!(key, label, "ring named a node label missing from the router");
                None
            }
        }
    }

    /// Routes `put` through the ring to whichever node currently owns `key`.
    pub fn put(&self, key: String, value: V) -> CacheResult<()> {
        let label = {
            let ring = self.ring.read();
            ring.get_node(&key)
        };
        let Some(label) = label else {
            warn!(key, "router has no nodes available for put");
            return Err(CacheError::NoNodesAvailable);
        };
        let node = self.nodes.read().get(&label).cloned();
        match node {
            Some(node) => node.put(key, value),
            None => {
                error!(key, label, "ring named a node label missing from the router");
                Err(CacheError::NoNodesAvailable)
            }
        }
    }

    /// Adds `node` under `label` to both the node map and the ring. No
    /// guarantee is made about which keys a live rebalance moves to this
    /// node's cold cache — see `ConsistentHashRing::add_node`.
    pub fn add_node(&self, label: impl Into<String>, node: Arc<CacheNode<String, V>>) {
        let label = label.into();
        self.nodes.write().insert(label.clone(), node);
        self.labels.write().push(label.clone());
        self.ring.write().add_node(&label);
        info!(label, "router added node");
    }

    /// Removes `label` from both the node map and the ring, without closing
    /// its writer. Callers that want a graceful writer drain should call
    /// [`CacheNode::close_writer`] themselves before dropping the returned
    /// node.
    pub fn remove_node(&self, label: &str) -> Option<Arc<CacheNode<String, V>>> {
        self.labels.write().retain(|l| l != label);
        self.ring.write().remove_node(label);
        let removed = self.nodes.write().remove(label);
        info!(label, removed = removed.is_some(), "router removed node");
        removed
    }

    /// Closes every node's writer, collecting rather than short-circuiting
    /// on the first failure.
    pub fn close(&self) -> Result<(), Vec<CacheError>> {
        let mut errors = Vec::new();
        for (label, node) in self.nodes.read().iter() {
            if let Err(err) = node.close_writer() {
                error!(label, %err, "node writer failed to close cleanly");
                errors.push(err);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}
