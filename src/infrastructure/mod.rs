//! Infrastructure layer
//!
//! This layer contains:
//! - Sharded signature database lookups with in-memory caching
//! - Error ABI resolution and revert decoding using alloy-dyn-abi
//! - ABI file scanning for database authoring

pub mod abi;

pub use abi::{AbiResolver, AbiScanner, DecoderOptions, ErrorDecoder, SignatureLoader};
