//! ABI infrastructure - signature lookup, resolution and revert decoding

mod decoder;
mod resolver;
mod scanner;
mod signatures;

pub use decoder::{DecoderOptions, ErrorDecoder};
pub use resolver::{AbiResolver, Candidate, DEFAULT_MAX_SELECTORS_IN_CACHE};
pub use scanner::{AbiScanner, ScanReport};
pub use signatures::{SignatureLoader, DEFAULT_MAX_FILES_IN_CACHE, DEFAULT_PREFIX_LENGTH};
