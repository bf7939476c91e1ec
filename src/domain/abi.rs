//! Error ABI definitions parsed from signature strings

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Error as JsonAbiError, Param};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{DecodeError, Result};

/// Structured decoding schema for one error signature
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorAbi {
    item: JsonAbiError,
    /// All inputs wrapped in a tuple, resolved once at parse time
    params: DynSolType,
}

impl ErrorAbi {
    /// Parse a signature such as `InsufficientBalance(address,uint256,uint256)`.
    ///
    /// The leading `error` keyword is accepted but not required.
    pub fn parse(signature: &str) -> Result<Self> {
        let item = JsonAbiError::parse(signature).map_err(|e| DecodeError::SignatureParse {
            signature: signature.to_string(),
            reason: e.to_string(),
        })?;

        let types = item
            .inputs
            .iter()
            .map(|param| {
                param.resolve().map_err(|e| DecodeError::SignatureParse {
                    signature: signature.to_string(),
                    reason: format!("type '{}': {}", param.ty, e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            item,
            params: DynSolType::Tuple(types),
        })
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }

    pub fn inputs(&self) -> &[Param] {
        &self.item.inputs
    }

    /// Canonical `Name(type,...)` form
    pub fn signature(&self) -> String {
        self.item.signature()
    }

    pub fn item(&self) -> &JsonAbiError {
        &self.item
    }

    /// Decode ABI-encoded parameter bytes (selector already stripped)
    pub fn decode_params(&self, data: &[u8]) -> std::result::Result<Vec<DynSolValue>, alloy_dyn_abi::Error> {
        if self.item.inputs.is_empty() {
            return Ok(Vec::new());
        }

        match self.params.abi_decode_params(data)? {
            DynSolValue::Tuple(values) => Ok(values),
            other => Ok(vec![other]),
        }
    }

    /// JSON ABI item, as it would appear in a contract's ABI file
    pub fn to_json(&self) -> Value {
        let mut json = serde_json::to_value(&self.item).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut json {
            map.entry("type").or_insert_with(|| Value::String("error".into()));
        }
        json
    }
}

impl Serialize for ErrorAbi {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Format a decoded value for display
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => {
            format!("0x{}", hex::encode(&word.as_slice()[..(*size).min(32)]))
        }
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => format!("{s:?}"),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            let items: Vec<String> = values.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(values) => {
            let items: Vec<String> = values.iter().map(format_value).collect();
            format!("({})", items.join(", "))
        }
        #[allow(unreachable_patterns)]
        _ => format!("{value:?}"),
    }
}

/// Convert a decoded value to JSON.
///
/// Numbers are emitted as decimal strings since they routinely exceed `u64`.
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) | DynSolValue::Tuple(values) => {
            Value::Array(values.iter().map(value_to_json).collect())
        }
        other => Value::String(format_value(other)),
    }
}
