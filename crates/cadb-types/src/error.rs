use thiserror::Error;

/// Errors produced when decoding identifiers from external text or bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex in {input:?}: {reason}")]
    InvalidHex { input: String, reason: String },

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
