//! Revert data conversion helpers

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::error::{DecodeError, Result};

/// Why a payload could not be read as text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("data is not valid UTF-8")]
    NotUtf8,
    #[error("data contains non-printable characters")]
    NonPrintable,
}

/// Parse hex revert data, with or without the `0x` prefix.
///
/// `""` and `"0x"` both parse to empty data.
pub fn parse_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let payload = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if payload.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex(format!(
            "odd number of hex digits in {trimmed:?}"
        )));
    }

    hex::decode(payload).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

/// Render bytes as lower-case `0x`-prefixed hex
pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Strictly decode the payload as printable UTF-8 text
pub fn decode_text(data: &[u8]) -> std::result::Result<String, TextError> {
    let text = std::str::from_utf8(data).map_err(|_| TextError::NotUtf8)?;
    if !is_printable(text) {
        return Err(TextError::NonPrintable);
    }
    Ok(text.to_string())
}

/// True when the text has no code point in the Unicode "Other" category
///
/// That covers control (Cc), format (Cf), surrogate (Cs), private use (Co)
/// and unassigned (Cn) code points.
pub fn is_printable(text: &str) -> bool {
    match &*OTHER_CATEGORY {
        Ok(re) => !re.is_match(text),
        Err(_) => false,
    }
}

static OTHER_CATEGORY: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\p{C}"));
