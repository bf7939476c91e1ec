//! Revert data decoding pipeline

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, trace};

use super::resolver::{AbiResolver, Candidate, DEFAULT_MAX_SELECTORS_IN_CACHE};
use super::signatures::{SignatureLoader, DEFAULT_MAX_FILES_IN_CACHE, DEFAULT_PREFIX_LENGTH};
use crate::domain::{
    decode_text, parse_hex, sort_results, split_revert_data, to_hex, DecodeResult, Selector,
};
use crate::error::Result;
use crate::store::{EvictionPolicy, FsShardStore, ShardStore};

/// Decoder construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Root directory of the shard database
    pub path: PathBuf,
    /// Selector hex chars used to choose a shard
    pub prefix_length: usize,
    /// Shard cache capacity
    pub max_files_in_cache: usize,
    /// Resolved ABI cache capacity
    pub max_selectors_in_cache: usize,
    /// Eviction policy for both caches
    pub eviction: EvictionPolicy,
}

impl DecoderOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            prefix_length: DEFAULT_PREFIX_LENGTH,
            max_files_in_cache: DEFAULT_MAX_FILES_IN_CACHE,
            max_selectors_in_cache: DEFAULT_MAX_SELECTORS_IN_CACHE,
            eviction: EvictionPolicy::OnInsert,
        }
    }
}

/// Turns revert payloads into a ranked list of interpretations
pub struct ErrorDecoder {
    abis: AbiResolver,
}

impl ErrorDecoder {
    /// Decoder over a directory of `<prefix>.json` shard files
    pub fn new(options: &DecoderOptions) -> Result<Self> {
        Self::with_store(Arc::new(FsShardStore::new(&options.path)), options)
    }

    /// Decoder over any shard store; `options.path` is ignored
    pub fn with_store(store: Arc<dyn ShardStore>, options: &DecoderOptions) -> Result<Self> {
        let signatures = SignatureLoader::new(
            store,
            options.prefix_length,
            options.max_files_in_cache,
            options.eviction,
        )?;
        Ok(Self {
            abis: AbiResolver::new(signatures, options.max_selectors_in_cache, options.eviction),
        })
    }

    pub fn resolver(&self) -> &AbiResolver {
        &self.abis
    }

    /// Decode hex revert data (with or without `0x`).
    ///
    /// Odd-length or non-hex input is an error.
    pub async fn decode_hex(&self, revert_data: &str) -> Result<Vec<DecodeResult>> {
        let bytes = parse_hex(revert_data)?;
        self.decode(&bytes).await
    }

    /// Decode raw revert data.
    ///
    /// Always yields at least one result, best interpretation first. Only
    /// signature database failures are returned as errors.
    pub async fn decode(&self, revert_data: &[u8]) -> Result<Vec<DecodeResult>> {
        let data = to_hex(revert_data);
        if revert_data.is_empty() {
            return Ok(vec![DecodeResult::Empty { data }]);
        }

        let Some((selector, params)) = split_revert_data(revert_data) else {
            trace!(%data, "no selector, trying text");
            return Ok(vec![decode_as_text(revert_data, data, None)]);
        };

        let candidates = match self.abis.lookup(selector).await? {
            Some(candidates) if !candidates.is_empty() => candidates,
            _ => {
                trace!(%selector, "no candidates, trying text");
                return Ok(vec![decode_as_text(revert_data, data, Some(selector))]);
            }
        };

        let mut results: Vec<DecodeResult> = candidates
            .iter()
            .map(|candidate| decode_with_candidate(&data, selector, candidate, params))
            .collect();

        if results.is_empty() {
            return Ok(vec![DecodeResult::Unmatched { selector, data }]);
        }

        sort_results(&mut results);
        debug!(%selector, results = results.len(), best = %results[0].kind(), "decoded revert data");
        Ok(results)
    }
}

fn decode_with_candidate(data: &str, selector: Selector, candidate: &Candidate, params: &[u8]) -> DecodeResult {
    match candidate.abi.decode_params(params) {
        Ok(values) => DecodeResult::Decoded {
            selector,
            signature: candidate.signature.clone(),
            abi: candidate.abi.clone(),
            data: data.to_string(),
            params: values,
        },
        Err(err) => {
            trace!(signature = %candidate.signature, error = %err, "parameters did not decode");
            DecodeResult::Matched {
                selector,
                signature: candidate.signature.clone(),
                abi: candidate.abi.clone(),
                data: data.to_string(),
            }
        }
    }
}

/// Read the whole payload as printable text, else report what little is known
fn decode_as_text(revert_data: &[u8], data: String, selector: Option<Selector>) -> DecodeResult {
    match decode_text(revert_data) {
        Ok(value) if !value.is_empty() => DecodeResult::Text { data, value },
        Ok(_) => fallback(data, selector),
        Err(err) => {
            trace!(error = %err, "not text");
            fallback(data, selector)
        }
    }
}

fn fallback(data: String, selector: Option<Selector>) -> DecodeResult {
    match selector {
        Some(selector) => DecodeResult::Unmatched { selector, data },
        None => DecodeResult::Unparsed { data },
    }
}
