//! Block-shape helpers shared by the extra-data compatibility shim.
//!
//! Strict clients reject blocks whose `extraData` is longer than 32 bytes.
//! Proof-of-authority chains put the signer seal there, so their blocks
//! carry 97 bytes or more.

use std::sync::OnceLock;

use ethrpc_core::{PipelineError, PipelineResult};
use regex::Regex;
use serde_json::Value;

/// Maximum `extraData` length a strict client accepts.
pub const MAX_EXTRA_DATA_BYTES: usize = 32;

/// Field the oversized seal is moved to.
pub const POA_FIELD: &str = "proofOfAuthorityData";

const EXTRA_DATA_FIELD: &str = "extraData";

fn extra_data_error_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)extra\s*data\b.*\b(length|bytes|long)\b").expect("static pattern is valid")
    })
}

/// Whether an error message reports an over-long `extraData` field.
pub fn is_extra_data_error(message: &str) -> bool {
    extra_data_error_pattern().is_match(message)
}

/// Whether `value` is a block object carrying an `extraData` field.
pub fn is_block_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|block| block.contains_key(EXTRA_DATA_FIELD))
}

/// Decoded byte length of a `0x`-prefixed hex string.
fn hex_byte_len(hex: &str) -> usize {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    digits.len().div_ceil(2)
}

/// Apply the strict `extraData` length check to a block.
///
/// Values that are not block-shaped pass.
pub fn validate_extra_data(block: &Value) -> PipelineResult<()> {
    let Some(extra_data) = block.get(EXTRA_DATA_FIELD).and_then(Value::as_str) else {
        return Ok(());
    };

    let length = hex_byte_len(extra_data);
    if length > MAX_EXTRA_DATA_BYTES {
        return Err(PipelineError::ExtraDataLength {
            length,
            max: MAX_EXTRA_DATA_BYTES,
        });
    }
    Ok(())
}

/// Move `extraData` into [`POA_FIELD`] on a single block.
///
/// Returns whether the block was rewritten.
pub fn relax_block(block: &mut Value) -> bool {
    let Some(object) = block.as_object_mut() else {
        return false;
    };
    match object.remove(EXTRA_DATA_FIELD) {
        Some(extra_data) => {
            object.insert(POA_FIELD.to_string(), extra_data);
            true
        }
        None => false,
    }
}

/// Relax every block in a result: the result itself or the elements of an
/// array result.
///
/// Returns the number of blocks rewritten.
pub fn relax_result(result: &mut Value) -> usize {
    match result {
        Value::Array(items) => items.iter_mut().map(relax_block).filter(|&rewritten| rewritten).count(),
        other => usize::from(relax_block(other)),
    }
}
