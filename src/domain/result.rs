//! Decode results and their ranking

use std::cmp::Reverse;
use std::fmt;

use alloy_dyn_abi::DynSolValue;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::abi::{format_value, value_to_json, ErrorAbi};
use super::selector::Selector;

/// One interpretation of a revert payload.
///
/// `data` always carries the full original payload as `0x`-hex. Serializes
/// as an object tagged with `"type"` (`"decoded"`, `"matched"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DecodeResult {
    /// Selector matched a signature, and decoding succeeded
    Decoded {
        selector: Selector,
        signature: String,
        abi: ErrorAbi,
        data: String,
        #[serde(serialize_with = "serialize_params")]
        params: Vec<DynSolValue>,
    },
    /// Selector matched a signature, but the decoding failed
    Matched {
        selector: Selector,
        signature: String,
        abi: ErrorAbi,
        data: String,
    },
    /// Did not match any selectors, decoded whole data as text
    Text { data: String, value: String },
    /// Did not match any selectors
    Unmatched { selector: Selector, data: String },
    /// Did not match any selectors and the data is not printable text
    Unparsed { data: String },
    /// Revert data was empty
    Empty { data: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Decoded,
    Matched,
    Text,
    Unmatched,
    Unparsed,
    Empty,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Decoded => "decoded",
            ResultKind::Matched => "matched",
            ResultKind::Text => "text",
            ResultKind::Unmatched => "unmatched",
            ResultKind::Unparsed => "unparsed",
            ResultKind::Empty => "empty",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DecodeResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            DecodeResult::Decoded { .. } => ResultKind::Decoded,
            DecodeResult::Matched { .. } => ResultKind::Matched,
            DecodeResult::Text { .. } => ResultKind::Text,
            DecodeResult::Unmatched { .. } => ResultKind::Unmatched,
            DecodeResult::Unparsed { .. } => ResultKind::Unparsed,
            DecodeResult::Empty { .. } => ResultKind::Empty,
        }
    }

    /// Sort key, higher is a more confident interpretation
    pub fn score(&self) -> u32 {
        match self {
            DecodeResult::Decoded { .. } => 100_000,
            DecodeResult::Matched { .. } => 10_000,
            DecodeResult::Text { .. } => 1_000,
            DecodeResult::Unmatched { .. } => 100,
            DecodeResult::Empty { .. } => 10,
            DecodeResult::Unparsed { .. } => 1,
        }
    }

    pub fn data(&self) -> &str {
        match self {
            DecodeResult::Decoded { data, .. }
            | DecodeResult::Matched { data, .. }
            | DecodeResult::Text { data, .. }
            | DecodeResult::Unmatched { data, .. }
            | DecodeResult::Unparsed { data }
            | DecodeResult::Empty { data } => data,
        }
    }

    pub fn selector(&self) -> Option<Selector> {
        match self {
            DecodeResult::Decoded { selector, .. }
            | DecodeResult::Matched { selector, .. }
            | DecodeResult::Unmatched { selector, .. } => Some(*selector),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            DecodeResult::Decoded { signature, .. } | DecodeResult::Matched { signature, .. } => {
                Some(signature)
            }
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn serialize_params<S: Serializer>(
    params: &[DynSolValue],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(params.iter().map(value_to_json))
}

impl fmt::Display for DecodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeResult::Decoded { abi, params, .. } => {
                let values: Vec<String> = params.iter().map(format_value).collect();
                write!(f, "decoded: {}({})", abi.name(), values.join(", "))
            }
            DecodeResult::Matched {
                selector, signature, ..
            } => write!(f, "matched: {signature} [{selector}] (parameters did not decode)"),
            DecodeResult::Text { value, .. } => write!(f, "text: {value:?}"),
            DecodeResult::Unmatched { selector, .. } => write!(f, "unmatched: {selector}"),
            DecodeResult::Unparsed { data } => write!(f, "unparsed: {data}"),
            DecodeResult::Empty { .. } => write!(f, "empty"),
        }
    }
}

/// Stable sort by descending score; ties keep their candidate order
pub fn sort_results(results: &mut [DecodeResult]) {
    results.sort_by_key(|result| Reverse(result.score()));
}
