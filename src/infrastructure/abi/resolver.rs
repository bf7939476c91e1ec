//! Selector -> error ABI resolution with an in-memory cache

use std::sync::Arc;

use tracing::{debug, trace};

use super::signatures::SignatureLoader;
use crate::domain::{ErrorAbi, Selector};
use crate::error::Result;
use crate::store::{BoundedCache, EvictionPolicy};

/// Resolved selectors kept in memory
pub const DEFAULT_MAX_SELECTORS_IN_CACHE: usize = 1000;

/// One signature stored for a selector, with its parsed schema
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub signature: String,
    pub abi: ErrorAbi,
}

/// Resolves selectors to every candidate error ABI in the signature database
pub struct AbiResolver {
    signatures: SignatureLoader,
    cache: BoundedCache<Selector, Arc<Vec<Candidate>>>,
}

impl AbiResolver {
    pub fn new(signatures: SignatureLoader, max_selectors_in_cache: usize, eviction: EvictionPolicy) -> Self {
        Self {
            signatures,
            cache: BoundedCache::with_policy(max_selectors_in_cache, eviction),
        }
    }

    pub fn signatures(&self) -> &SignatureLoader {
        &self.signatures
    }

    /// Number of selectors currently held in memory
    pub fn cached_selectors(&self) -> usize {
        self.cache.len()
    }

    /// Candidates for `selector` (`0x` + 8 hex chars)
    pub async fn get(&self, selector: &str) -> Result<Option<Arc<Vec<Candidate>>>> {
        self.lookup(selector.parse()?).await
    }

    /// Candidates for a parsed selector.
    ///
    /// Unknown selectors are not cached, so they hit the database every time.
    /// A stored signature that does not parse fails the whole lookup.
    pub async fn lookup(&self, selector: Selector) -> Result<Option<Arc<Vec<Candidate>>>> {
        if let Some(cached) = self.cache.get(&selector) {
            trace!(%selector, "selector cache hit");
            return Ok(Some(cached));
        }

        let Some(signatures) = self.signatures.lookup(selector).await? else {
            debug!(%selector, "selector not in signature database");
            return Ok(None);
        };

        let candidates = signatures
            .into_iter()
            .map(|signature| {
                let abi = ErrorAbi::parse(&signature)?;
                Ok(Candidate { signature, abi })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(%selector, candidates = candidates.len(), "resolved selector");
        let candidates = Arc::new(candidates);
        self.cache.set(selector, candidates.clone());
        Ok(Some(candidates))
    }
}
