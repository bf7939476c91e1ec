//! Offline maintenance of the sharded signature database

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::shards::parse_shard;
use crate::domain::Selector;
use crate::error::{DecodeError, Result};

/// Largest prefix length `init` will lay out (16^4 files)
const MAX_INIT_PREFIX_LENGTH: usize = 4;

/// An error definition ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSignature {
    pub selector: Selector,
    /// Canonical `Name(type,...)` form
    pub signature: String,
}

/// Summary of one `add` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Signatures appended to an existing selector
    pub appended: usize,
    /// New selectors inserted
    pub inserted: usize,
    /// Signatures that were already present
    pub duplicates: usize,
    /// Shard files rewritten
    pub written: Vec<PathBuf>,
}

/// Writes shard files under a database directory
#[derive(Debug, Clone)]
pub struct ShardWriter {
    base: PathBuf,
    prefix_length: usize,
}

impl ShardWriter {
    pub fn new(base: impl Into<PathBuf>, prefix_length: usize) -> Result<Self> {
        if !(1..=8).contains(&prefix_length) {
            return Err(DecodeError::Config(format!(
                "prefix length must be between 1 and 8, got {prefix_length}"
            )));
        }
        Ok(Self {
            base: base.into(),
            prefix_length,
        })
    }

    pub fn shard_path(&self, prefix: &str) -> PathBuf {
        self.base.join(format!("{prefix}.json"))
    }

    /// Merge error definitions into their shards.
    ///
    /// Every affected shard must already exist. Shards are rewritten in full,
    /// and only when something changed. A rewrite always sorts the keys, even
    /// when the change only appended a signature to an existing selector.
    pub fn add(&self, errors: &[SelectorSignature]) -> Result<AddReport> {
        let mut by_prefix: BTreeMap<String, Vec<&SelectorSignature>> = BTreeMap::new();
        for error in errors {
            by_prefix
                .entry(error.selector.prefix(self.prefix_length))
                .or_default()
                .push(error);
        }

        let mut report = AddReport::default();
        for (prefix, errors) in by_prefix {
            let path = self.shard_path(&prefix);
            let mut shard = self.read_shard(&prefix, &path)?;
            let mut changed = false;

            for error in errors {
                let selector = error.selector.to_string();
                match shard.get_mut(&selector) {
                    Some(existing) if existing.contains(&error.signature) => {
                        warn!(signature = %error.signature, "signature already exists");
                        report.duplicates += 1;
                    }
                    Some(existing) => {
                        info!(signature = %error.signature, %selector, "adding signature to existing selector");
                        existing.push(error.signature.clone());
                        report.appended += 1;
                        changed = true;
                    }
                    None => {
                        shard.insert(selector, vec![error.signature.clone()]);
                        report.inserted += 1;
                        changed = true;
                    }
                }
            }

            if changed {
                write_shard(&self.base, &path, &shard)?;
                info!(path = %path.display(), "wrote shard");
                report.written.push(path);
            }
        }

        Ok(report)
    }

    /// Create every missing shard file as an empty mapping
    pub fn init(&self) -> Result<usize> {
        if self.prefix_length > MAX_INIT_PREFIX_LENGTH {
            return Err(DecodeError::Config(format!(
                "refusing to create 16^{} shard files",
                self.prefix_length
            )));
        }

        fs::create_dir_all(&self.base).map_err(|e| DecodeError::io(&self.base, e))?;

        let mut created = 0;
        for n in 0..16usize.pow(self.prefix_length as u32) {
            let prefix = format!("{n:0width$x}", width = self.prefix_length);
            let path = self.shard_path(&prefix);
            if path.exists() {
                continue;
            }
            write_shard(&self.base, &path, &BTreeMap::new())?;
            created += 1;
        }

        info!(created, base = %self.base.display(), "initialized shard files");
        Ok(created)
    }

    fn read_shard(&self, prefix: &str, path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                warn!(path = %path.display(), "shard file missing, run init first");
            }
            DecodeError::io(path, e)
        })?;
        Ok(parse_shard(prefix, &contents)?.into_iter().collect())
    }
}

/// Replace a shard file atomically: write a sibling temp file, then rename over
fn write_shard(dir: &Path, path: &Path, shard: &BTreeMap<String, Vec<String>>) -> Result<()> {
    let json = serde_json::to_string_pretty(shard)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| DecodeError::io(dir, e))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| DecodeError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| DecodeError::io(path, e.error))?;
    Ok(())
}
