use serde::{Deserialize, Serialize};

use crate::decoder::decode;
use crate::error::DecodeError;

const CALL_OPEN: &str = "initReader(\"";
const ARG_CLOSE: &str = "\", \"";

/// Decoded reader payload: an ordered list of image paths for one chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderPayload {
    pub pages: Vec<String>,
}

/// Pull the encoded blob out of a reader page's inline script text, i.e.
/// the first argument of `initReader("…", "…")`. Returns `None` when the
/// call (or its second argument, which terminates the first) is missing.
pub fn extract_reader_blob(script: &str) -> Option<&str> {
    let start = script.find(CALL_OPEN)? + CALL_OPEN.len();
    let rest = &script[start..];
    let end = rest.find(ARG_CLOSE)?;
    Some(&rest[..end])
}

/// Parse decoded plaintext into the payload model.
pub fn parse_payload(plaintext: &str) -> Result<ReaderPayload, DecodeError> {
    Ok(serde_json::from_str(plaintext)?)
}

/// Decode a blob straight to its ordered page paths.
pub fn decode_pages(encoded: &str) -> Result<Vec<String>, DecodeError> {
    let payload = parse_payload(&decode(encoded)?)?;
    tracing::debug!(pages = payload.pages.len(), "decoded reader page list");
    Ok(payload.pages)
}
