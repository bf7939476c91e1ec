//! Shard storage backends for the signature database
//!
//! The database maps selectors to signature lists and is partitioned into
//! shards keyed by a selector prefix. A `ShardStore` only knows how to fetch
//! one shard; caching and prefix selection live in the signature loader.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DecodeError, Result};

/// One shard: full selector (`0x` + 8 hex chars) -> ordered signatures
pub type Shard = HashMap<String, Vec<String>>;

/// Storage capability for signature database shards
#[async_trait]
pub trait ShardStore: Send + Sync {
    /// Load the shard for `prefix`.
    ///
    /// A shard that cannot be read is an error. Contents that are not a
    /// selector -> signature list mapping are a `CorruptShard` error.
    async fn load_shard(&self, prefix: &str) -> Result<Shard>;
}

/// Parse the JSON contents of one shard
pub fn parse_shard(prefix: &str, contents: &str) -> Result<Shard> {
    serde_json::from_str::<Shard>(contents).map_err(|e| DecodeError::CorruptShard {
        prefix: prefix.to_string(),
        reason: e.to_string(),
    })
}

/// Shards stored as `<base>/<prefix>.json` files
#[derive(Debug, Clone)]
pub struct FsShardStore {
    base: PathBuf,
}

impl FsShardStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn shard_path(&self, prefix: &str) -> PathBuf {
        self.base.join(format!("{prefix}.json"))
    }
}

#[async_trait]
impl ShardStore for FsShardStore {
    async fn load_shard(&self, prefix: &str) -> Result<Shard> {
        let path = self.shard_path(prefix);
        debug!(path = %path.display(), "reading shard");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| DecodeError::io(path, err))?;
        parse_shard(prefix, &contents)
    }
}

/// Shards held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryShardStore {
    shards: HashMap<String, Shard>,
}

impl MemoryShardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature under `selector`, sharded by the first `prefix_length` hex chars
    pub fn insert(&mut self, prefix_length: usize, selector: &str, signature: impl Into<String>) {
        let selector = selector.to_lowercase();
        let digits = selector.strip_prefix("0x").unwrap_or(&selector);
        let prefix = digits[..prefix_length.min(digits.len())].to_string();
        self.shards
            .entry(prefix)
            .or_default()
            .entry(selector)
            .or_default()
            .push(signature.into());
    }

    pub fn insert_shard(&mut self, prefix: impl Into<String>, shard: Shard) {
        self.shards.insert(prefix.into(), shard);
    }
}

#[async_trait]
impl ShardStore for MemoryShardStore {
    async fn load_shard(&self, prefix: &str) -> Result<Shard> {
        Ok(self.shards.get(prefix).cloned().unwrap_or_default())
    }
}
