//! Navigate JSON-like documents without mapping them onto fixed types.
//!
//! A document is decoded once by a [`Codec`] into a [`Value`] tree and
//! wrapped in a root [`Node`]. From there the caller can:
//!
//! - ask what shape a node has (`is_object`, `is_array`, `kind`, ...)
//! - extract typed data (`int`, `float`, `boolean`, `as_str`), getting a
//!   [`NodeError`] instead of a panic when the shape is wrong
//! - move around (`get`, `index`, `slice`, `parent`) while keeping track of
//!   how each node was reached
//! - search the subtree lazily with [`Node::find`]
//! - escape back into static types with [`Node::unmarshal`]
//!
//! # Example
//!
//! ```
//! use json_node::{Node, Visit};
//!
//! let doc = br#"{"data":1,"children":[{"data":2,"children":[]},{"data":3,"children":[]}]}"#;
//! let root = Node::from_bytes(doc).unwrap();
//!
//! assert_eq!(root.get("children")?.index(1)?.get("data")?.int()?, 3);
//!
//! let mut data: Vec<i64> = root
//!     .find(|n| Visit::from(n.parent_key() == Some("data")))
//!     .map(|n| n.int())
//!     .collect::<Result<_, _>>()?;
//! data.sort();
//! assert_eq!(data, vec![1, 2, 3]);
//! # Ok::<(), json_node::NodeError>(())
//! ```

pub mod codec;
pub mod error;
pub mod node;
pub mod traversal;
pub mod value;

pub use codec::{default_codec, set_default_codec, Codec, CodecKind, FnCodec, JsonCodec, SharedCodec};
#[cfg(feature = "cbor")]
pub use codec::CborCodec;
#[cfg(feature = "msgpack")]
pub use codec::MsgPackCodec;
pub use error::{CodecError, NodeError};
pub use node::{Elements, Entries, Node, PathStep, Position};
pub use traversal::{Find, FindStream, TryFind, Visit};
pub use value::{Kind, Map, Number, Value};
