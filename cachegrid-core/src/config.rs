use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Which [`EvictionPolicy`](crate::EvictionPolicy) a configured node should
/// use. Translating this into an actual `Box<dyn EvictionPolicy<K>>` is the
/// caller's job — the policy trait is generic over the key type, so this
/// enum can't construct one itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Lru,
    Lfu,
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Lru
    }
}

/// Declarative defaults for constructing a [`CacheNode`](crate::CacheNode).
///
/// The node's constructor remains the source of truth; this struct only
/// seeds programmatic defaults or a demo binary's startup configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub capacity: usize,
    #[serde(default)]
    pub policy: PolicyKind,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            policy: PolicyKind::Lru,
        }
    }
}

/// Declarative defaults for constructing a
/// [`ConsistentHashRing`](crate::ConsistentHashRing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    pub replicas: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: crate::ring::DEFAULT_REPLICAS,
        }
    }
}

/// Top-level configuration bundle, loadable from a TOML file layered over
/// environment variables prefixed `CACHEGRID_`, both layered over the
/// in-code defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGridConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub ring: RingConfig,
}

impl Default for CacheGridConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            ring: RingConfig::default(),
        }
    }
}

impl CacheGridConfig {
    /// Layers defaults, then an optional TOML file at `path` (missing file is
    /// not an error), then `CACHEGRID_`-prefixed environment variables.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(CacheGridConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CACHEGRID_").split("_"))
            .extract()
    }
}
