//! Pluggable encode/decode pairs.
//!
//! A [`Node`](crate::Node) never depends on a concrete format: it holds a
//! [`SharedCodec`] and calls it whenever it is (re)encoded. Built-in codecs:
//!
//! - [`JsonCodec`]: `serde_json`, the process default
//! - [`CborCodec`]: `ciborium` (feature `cbor`)
//! - [`MsgPackCodec`]: `rmp-serde` (feature `msgpack`)
//!
//! Any other format can be plugged in by implementing [`Codec`] or by
//! pairing two functions in a [`FnCodec`].

#[cfg(feature = "cbor")]
mod cbor;
mod json;
#[cfg(feature = "msgpack")]
mod msgpack;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::error::CodecError;
use crate::value::Value;

#[cfg(feature = "cbor")]
pub use cbor::CborCodec;
pub use json::JsonCodec;
#[cfg(feature = "msgpack")]
pub use msgpack::MsgPackCodec;

/// An encode/decode pair over [`Value`].
pub trait Codec: Send + Sync {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &'static str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError>;
}

/// Codec handle shared by every node of a tree.
pub type SharedCodec = Arc<dyn Codec>;

pub type EncodeFn = fn(&Value) -> Result<Vec<u8>, CodecError>;
pub type DecodeFn = fn(&[u8]) -> Result<Value, CodecError>;

/// A codec made of two plain functions.
///
/// # Example
///
/// ```
/// use json_node::{CodecError, FnCodec, Node, Value};
/// use std::sync::Arc;
///
/// fn encode(v: &Value) -> Result<Vec<u8>, CodecError> {
///     Ok(v.to_string().into_bytes())
/// }
///
/// fn decode(data: &[u8]) -> Result<Value, CodecError> {
///     serde_json::from_slice(data).map_err(|e| CodecError::decode("text", e))
/// }
///
/// let codec = Arc::new(FnCodec::new("text", encode, decode));
/// let node = Node::from_bytes_with_codec(br#"{"a":1}"#, codec).unwrap();
/// assert_eq!(node.marshal().unwrap(), br#"{"a":1}"#);
/// ```
#[derive(Clone, Copy)]
pub struct FnCodec {
    name: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl FnCodec {
    pub const fn new(name: &'static str, encode: EncodeFn, decode: DecodeFn) -> Self {
        Self {
            name,
            encode,
            decode,
        }
    }
}

impl fmt::Debug for FnCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec").field("name", &self.name).finish()
    }
}

impl Codec for FnCodec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        (self.decode)(data)
    }
}

/// Built-in codec selector, parsed from names such as `"json"` or `"cbor"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Json,
    #[cfg(feature = "cbor")]
    Cbor,
    #[cfg(feature = "msgpack")]
    MsgPack,
}

impl CodecKind {
    pub fn into_codec(self) -> SharedCodec {
        match self {
            CodecKind::Json => Arc::new(JsonCodec::new()),
            #[cfg(feature = "cbor")]
            CodecKind::Cbor => Arc::new(CborCodec),
            #[cfg(feature = "msgpack")]
            CodecKind::MsgPack => Arc::new(MsgPackCodec),
        }
    }
}

impl FromStr for CodecKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(CodecKind::Json),
            #[cfg(feature = "cbor")]
            "cbor" => Ok(CodecKind::Cbor),
            #[cfg(feature = "msgpack")]
            "msgpack" | "messagepack" => Ok(CodecKind::MsgPack),
            other => Err(CodecError::UnknownCodec(other.to_string())),
        }
    }
}

static DEFAULT_CODEC: OnceLock<SharedCodec> = OnceLock::new();

/// The codec used by [`Node::from_bytes`](crate::Node::from_bytes) and
/// [`Node::from_value`](crate::Node::from_value). JSON unless
/// [`set_default_codec`] ran first.
pub fn default_codec() -> SharedCodec {
    DEFAULT_CODEC
        .get_or_init(|| Arc::new(JsonCodec::new()))
        .clone()
}

/// Installs the process-wide default codec.
///
/// Only possible before the default has been read for the first time;
/// afterwards the codec is handed back unchanged.
pub fn set_default_codec(codec: SharedCodec) -> Result<(), SharedCodec> {
    DEFAULT_CODEC.set(codec)
}
