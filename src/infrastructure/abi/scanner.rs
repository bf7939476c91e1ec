//! ABI file scanner - extracts error definitions from ABI files on disk

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use alloy_json_abi::JsonAbi;
use walkdir::WalkDir;

use crate::domain::Selector;
use crate::error::{DecodeError, Result};
use crate::store::SelectorSignature;

/// Files larger than this are never ABIs worth reading
const MAX_ABI_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Outcome of scanning a directory tree
#[derive(Debug, Default)]
pub struct ScanReport {
    pub errors: Vec<SelectorSignature>,
    pub scanned_files: usize,
    /// Files that looked like ABIs but could not be read
    pub failures: Vec<String>,
    pub scan_ms: u128,
}

/// ABI file scanner
pub struct AbiScanner;

impl AbiScanner {
    /// Read an ABI file: a raw ABI array, or an artifact object with an `abi` field
    pub fn read_abi(path: impl AsRef<Path>) -> Result<JsonAbi> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| DecodeError::io(path, e))?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        let abi_value = if value.is_array() {
            value
        } else if let Some(abi) = value.get("abi").filter(|abi| abi.is_array()) {
            abi.clone()
        } else {
            return Err(DecodeError::InvalidAbi(path.display().to_string()));
        };

        Ok(serde_json::from_value(abi_value)?)
    }

    /// Selector and canonical signature of every `error` item in the ABI
    pub fn extract_errors(abi: &JsonAbi) -> Vec<SelectorSignature> {
        abi.errors()
            .map(|error| SelectorSignature {
                selector: Selector::new(error.selector().0),
                signature: error.signature(),
            })
            .collect()
    }

    /// Extract errors from a single ABI file, or every ABI under a directory
    pub fn scan(root: impl AsRef<Path>) -> Result<ScanReport> {
        let root = root.as_ref();
        if root.is_file() {
            let abi = Self::read_abi(root)?;
            return Ok(ScanReport {
                errors: Self::extract_errors(&abi),
                scanned_files: 1,
                ..ScanReport::default()
            });
        }
        Ok(Self::scan_dir(root))
    }

    fn scan_dir(root: &Path) -> ScanReport {
        let started = Instant::now();
        let mut report = ScanReport::default();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !Self::is_ignored_dir(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    report.failures.push(err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    report.failures.push(format!("{}: {}", path.display(), err));
                    continue;
                }
            };
            if metadata.len() > MAX_ABI_FILE_SIZE {
                continue;
            }

            report.scanned_files += 1;

            match Self::read_abi(path) {
                Ok(abi) => report.errors.extend(Self::extract_errors(&abi)),
                // Not every JSON file is an ABI
                Err(DecodeError::InvalidAbi(_)) => {}
                Err(err) => report.failures.push(format!("{}: {}", path.display(), err)),
            }
        }

        report.scan_ms = started.elapsed().as_millis();
        report
    }

    /// Scan several roots into one report
    pub fn scan_roots(roots: &[PathBuf]) -> Result<ScanReport> {
        let started = Instant::now();
        let mut merged = ScanReport::default();

        for root in roots {
            let report = Self::scan(root)?;
            merged.errors.extend(report.errors);
            merged.scanned_files += report.scanned_files;
            merged.failures.extend(report.failures);
        }

        merged.scan_ms = started.elapsed().as_millis();
        Ok(merged)
    }

    /// Check if a path should be ignored
    fn is_ignored_dir(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| {
                matches!(
                    name,
                    ".git" | "target" | "node_modules" | ".next" | "dist" | "cache"
                )
            })
            .unwrap_or(false)
    }
}
