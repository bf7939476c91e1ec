//! Storage: bounded caches and the sharded signature database

mod authoring;
mod cache;
mod shards;
mod sqlite;

pub use authoring::{AddReport, SelectorSignature, ShardWriter};
pub use cache::{BoundedCache, EvictionPolicy, DEFAULT_SWEEP_INTERVAL};
pub use shards::{parse_shard, FsShardStore, MemoryShardStore, Shard, ShardStore};
pub use sqlite::SqliteShardStore;
