use thiserror::Error;

/// Errors produced while recovering a reader payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The blob was not valid base64, or decoded to too few bytes for the
    /// key material the cipher needs. Retrying the same input cannot succeed.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// The blob decoded cleanly but the plaintext was not the expected JSON
    /// payload. Usually means the site changed its reader format upstream.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(#[from] serde_json::Error),
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::MalformedInput {
            reason: reason.into(),
        }
    }

    /// True for inputs that can never decode, as opposed to format drift.
    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeError::MalformedInput { .. })
    }
}
