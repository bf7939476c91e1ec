//! Decode smart-contract revert data into ranked, human-readable errors.
//!
//! A payload's 4-byte selector is looked up in a sharded signature database,
//! every colliding signature is tried against the parameter bytes, and the
//! resulting interpretations are ranked from a full decode down to "nothing
//! could be read".
//!
//! ```no_run
//! # async fn run() -> revert_decoder::Result<()> {
//! use revert_decoder::{DecoderOptions, ErrorDecoder};
//!
//! let decoder = ErrorDecoder::new(&DecoderOptions::new("./data"))?;
//! for result in decoder.decode_hex("0xdb42144d").await? {
//!     println!("{result}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod store;

pub use domain::{DecodeResult, ErrorAbi, ResultKind, Selector};
pub use error::{DecodeError, Result};
pub use infrastructure::abi::{AbiResolver, AbiScanner, Candidate, DecoderOptions, ErrorDecoder, SignatureLoader};
pub use store::{BoundedCache, EvictionPolicy, FsShardStore, MemoryShardStore, ShardStore, ShardWriter, SqliteShardStore};
