//! Revert decoding domain models
//!
//! Pure types shared by the storage and decoding layers, independent of
//! where signatures come from.

mod abi;
mod data;
mod result;
mod selector;

pub use abi::{format_value, value_to_json, ErrorAbi};
pub use data::{decode_text, is_printable, parse_hex, to_hex, TextError};
pub use result::{sort_results, DecodeResult, ResultKind};
pub use selector::{split_revert_data, Selector, SELECTOR_HEX_LEN, SELECTOR_LEN};
