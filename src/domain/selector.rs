//! 4-byte error selectors

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::DecodeError;

/// Width of a selector in bytes
pub const SELECTOR_LEN: usize = 4;

/// Width of a selector rendered as `0x` + 8 hex chars
pub const SELECTOR_HEX_LEN: usize = 2 + SELECTOR_LEN * 2;

/// A 4-byte error selector.
///
/// Always rendered lower-case with a `0x` prefix, which is the form used as a
/// key in the signature database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector([u8; SELECTOR_LEN]);

impl Selector {
    pub const fn new(bytes: [u8; SELECTOR_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SELECTOR_LEN] {
        &self.0
    }

    /// The first `len` hex characters after the `0x` marker, used to pick a shard
    pub fn prefix(&self, len: usize) -> String {
        let hex = hex::encode(self.0);
        hex[..len.min(hex.len())].to_string()
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Selector {
    type Err = DecodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::InvalidSelector(value.to_string());

        if value.len() != SELECTOR_HEX_LEN {
            return Err(invalid());
        }
        let payload = value.strip_prefix("0x").ok_or_else(invalid)?;

        let mut bytes = [0u8; SELECTOR_LEN];
        hex::decode_to_slice(payload, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }
}

impl From<[u8; SELECTOR_LEN]> for Selector {
    fn from(bytes: [u8; SELECTOR_LEN]) -> Self {
        Self(bytes)
    }
}

/// Split revert data into its leading selector and the trailing parameter bytes.
///
/// Returns `None` when the payload is too short to carry a selector.
pub fn split_revert_data(data: &[u8]) -> Option<(Selector, &[u8])> {
    if data.len() < SELECTOR_LEN {
        return None;
    }
    let (head, params) = data.split_at(SELECTOR_LEN);
    let bytes: [u8; SELECTOR_LEN] = head.try_into().ok()?;
    Some((Selector(bytes), params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let selector: Selector = "0xDB42144D".parse().unwrap();
        assert_eq!(selector.as_bytes(), &[0xdb, 0x42, 0x14, 0x4d]);
        assert_eq!(selector.to_string(), "0xdb42144d");
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", "0x", "db42144d", "0xdb42144", "0xdb42144d00", "1xdb42144d", "0xzz42144d"] {
            let result = input.parse::<Selector>();
            assert!(
                matches!(result, Err(DecodeError::InvalidSelector(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_prefix() {
        let selector = Selector::new([0xdb, 0x42, 0x14, 0x4d]);
        assert_eq!(selector.prefix(2), "db");
        assert_eq!(selector.prefix(3), "db4");
        assert_eq!(selector.prefix(8), "db42144d");
    }

    #[test]
    fn test_split_revert_data() {
        assert!(split_revert_data(&[]).is_none());
        assert!(split_revert_data(&[0x01, 0x02, 0x03]).is_none());

        let (selector, params) = split_revert_data(&[0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(selector.to_string(), "0x01020304");
        assert!(params.is_empty());

        let (selector, params) = split_revert_data(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee]).unwrap();
        assert_eq!(selector.to_string(), "0xaabbccdd");
        assert_eq!(params, &[0xee]);
    }
}
