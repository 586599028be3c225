//! Error types for codecs and node accessors.

use std::fmt::Display;

use thiserror::Error;

use crate::value::Kind;

/// Failure raised while turning bytes into a [`Value`](crate::Value) or back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("{codec}: cannot encode value: {message}")]
    Encode { codec: &'static str, message: String },
    #[error("{codec}: cannot decode input: {message}")]
    Decode { codec: &'static str, message: String },
    #[error("unknown codec: {0}")]
    UnknownCodec(String),
    #[error("{0}")]
    Custom(String),
}

impl CodecError {
    pub fn encode(codec: &'static str, err: impl Display) -> Self {
        CodecError::Encode {
            codec,
            message: err.to_string(),
        }
    }

    pub fn decode(codec: &'static str, err: impl Display) -> Self {
        CodecError::Decode {
            codec,
            message: err.to_string(),
        }
    }
}

impl serde::de::Error for CodecError {
    fn custom<T: Display>(msg: T) -> Self {
        CodecError::Custom(msg.to_string())
    }
}

/// Failure raised by a [`Node`](crate::Node) accessor.
///
/// A missing object key is not an error: [`Node::get`](crate::Node::get)
/// yields a null node and presence is tested with `has`/`try_get`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: Kind },
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error("invalid range {start}..{end} for length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("number {0} does not fit in i64")]
    IntOverflow(u64),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl NodeError {
    pub(crate) fn mismatch(expected: &'static str, found: Kind) -> Self {
        NodeError::TypeMismatch { expected, found }
    }
}
