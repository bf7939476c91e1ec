//! Sharded signature database lookups

use std::sync::Arc;

use tracing::{debug, trace};

use crate::domain::Selector;
use crate::error::{DecodeError, Result};
use crate::store::{BoundedCache, EvictionPolicy, Shard, ShardStore};

/// Selector hex chars used to pick a shard, `2` => `00.json` .. `ff.json`
pub const DEFAULT_PREFIX_LENGTH: usize = 2;

/// Shards kept in memory
pub const DEFAULT_MAX_FILES_IN_CACHE: usize = 2;

/// Loads selector -> signature lists from a sharded store, keeping the most
/// recently used shards in memory
pub struct SignatureLoader {
    store: Arc<dyn ShardStore>,
    cache: BoundedCache<String, Arc<Shard>>,
    prefix_length: usize,
}

impl SignatureLoader {
    pub fn new(
        store: Arc<dyn ShardStore>,
        prefix_length: usize,
        max_files_in_cache: usize,
        eviction: EvictionPolicy,
    ) -> Result<Self> {
        if !(1..=8).contains(&prefix_length) {
            return Err(DecodeError::Config(format!(
                "prefix length must be between 1 and 8, got {prefix_length}"
            )));
        }

        Ok(Self {
            store,
            cache: BoundedCache::with_policy(max_files_in_cache, eviction),
            prefix_length,
        })
    }

    pub fn prefix_length(&self) -> usize {
        self.prefix_length
    }

    /// Number of shards currently held in memory
    pub fn cached_shards(&self) -> usize {
        self.cache.len()
    }

    /// Signatures stored for `selector` (`0x` + 8 hex chars)
    pub async fn get(&self, selector: &str) -> Result<Option<Vec<String>>> {
        self.lookup(selector.parse()?).await
    }

    pub async fn lookup(&self, selector: Selector) -> Result<Option<Vec<String>>> {
        let prefix = selector.prefix(self.prefix_length);
        let shard = self.shard(&prefix).await?;
        Ok(shard.get(&selector.to_string()).cloned())
    }

    async fn shard(&self, prefix: &str) -> Result<Arc<Shard>> {
        let key = prefix.to_string();
        if let Some(shard) = self.cache.get(&key) {
            trace!(prefix, "shard cache hit");
            return Ok(shard);
        }

        let shard = Arc::new(self.store.load_shard(prefix).await?);
        debug!(prefix, selectors = shard.len(), "loaded shard");
        self.cache.set(key, shard.clone());
        Ok(shard)
    }
}
