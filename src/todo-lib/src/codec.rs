use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::{CaptureError, CaptureResult};

pub const APPEND_SEPARATOR: &str = "\n\n";

/// Decode the store's base64 transport text.
///
/// The contents API wraps base64 at 60 columns, so ASCII whitespace is dropped
/// before decoding.
pub fn decode_transport(encoded: &str) -> CaptureResult<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CaptureError::DecodeError(format!("invalid base64 content: {}", e)))
}

pub fn encode_transport(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode_text(data: Vec<u8>) -> CaptureResult<String> {
    String::from_utf8(data)
        .map_err(|e| CaptureError::DecodeError(format!("stored content is not utf-8: {}", e)))
}

pub fn append_text(current: &str, new_text: &str, separator: &str) -> String {
    let mut updated = String::with_capacity(current.len() + separator.len() + new_text.len());
    updated.push_str(current);
    updated.push_str(separator);
    updated.push_str(new_text);
    updated
}
