//! [`Node`]: a read-only cursor over a decoded document.
//!
//! A node owns a [`Value`], the codec that produced it, and an optional link
//! to the node it was reached from. Navigation (`get`, `index`, `slice`)
//! always builds a new node; nothing is ever mutated in place. Because
//! values are reference-counted, building a child costs a few pointer
//! copies regardless of how large the subtree is.

use std::borrow::Cow;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::codec::{default_codec, SharedCodec};
use crate::error::{CodecError, NodeError};
use crate::value::{Kind, Number, Value};

/// How a node was reached from its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Object field.
    Key(String),
    /// Array element, or one byte of a byte sequence.
    Index(usize),
    /// Sub-range `start..end` of an array or byte sequence.
    Slice { start: usize, end: usize },
}

/// One step of a node's [`path`](Node::path) from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

struct Link {
    parent: Node,
    position: Position,
}

/// A value plus its codec and parent context.
#[derive(Clone)]
pub struct Node {
    value: Value,
    codec: SharedCodec,
    link: Option<Arc<Link>>,
}

impl Node {
    /// Decodes `data` with the process default codec.
    ///
    /// # Example
    ///
    /// ```
    /// use json_node::Node;
    ///
    /// let root = Node::from_bytes(br#"{"data":1,"children":[{"data":2},{"data":3}]}"#).unwrap();
    /// let data = root.get("children")?.index(1)?.get("data")?.int()?;
    /// assert_eq!(data, 3);
    /// # Ok::<(), json_node::NodeError>(())
    /// ```
    pub fn from_bytes(data: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        Self::from_bytes_with_codec(data, default_codec())
    }

    pub fn from_bytes_with_codec(
        data: impl AsRef<[u8]>,
        codec: SharedCodec,
    ) -> Result<Self, CodecError> {
        let value = codec.decode(data.as_ref())?;
        Ok(Self::root(value, codec))
    }

    /// Wraps a value that was never encoded, using the default codec.
    pub fn from_value(value: impl Into<Value>) -> Self {
        Self::root(value.into(), default_codec())
    }

    pub fn from_value_with_codec(value: impl Into<Value>, codec: SharedCodec) -> Self {
        Self::root(value.into(), codec)
    }

    fn root(value: Value, codec: SharedCodec) -> Self {
        Self {
            value,
            codec,
            link: None,
        }
    }

    fn child(&self, value: Value, position: Position) -> Self {
        Self {
            value,
            codec: self.codec.clone(),
            link: Some(Arc::new(Link {
                parent: self.clone(),
                position,
            })),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn codec(&self) -> &SharedCodec {
        &self.codec
    }

    pub fn kind(&self) -> Kind {
        self.value.kind()
    }

    // ── Type predicates ──────────────────────────────────────────────────

    pub fn is_object(&self) -> bool {
        matches!(self.value, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.value, Value::Array(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self.value, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.value, Value::String(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.value, Value::Bool(_))
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self.value, Value::Bytes(_))
    }

    // ── Typed extraction ─────────────────────────────────────────────────

    /// Integer value. Floats truncate toward zero.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` for non-numbers, `IntOverflow` for unsigned values
    /// above `i64::MAX`.
    pub fn int(&self) -> Result<i64, NodeError> {
        match self.value {
            Value::Number(Number::Int(i)) => Ok(i),
            Value::Number(Number::UInt(u)) => {
                i64::try_from(u).map_err(|_| NodeError::IntOverflow(u))
            }
            Value::Number(Number::Float(f)) => Ok(f as i64),
            _ => Err(NodeError::mismatch("number", self.kind())),
        }
    }

    pub fn float(&self) -> Result<f64, NodeError> {
        match self.value {
            Value::Number(n) => Ok(n.as_f64()),
            _ => Err(NodeError::mismatch("number", self.kind())),
        }
    }

    pub fn boolean(&self) -> Result<bool, NodeError> {
        self.value
            .as_bool()
            .ok_or_else(|| NodeError::mismatch("bool", self.kind()))
    }

    /// The string, only if this node holds one. See the `Display` impl for
    /// a rendering that works on every shape.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    pub fn as_bytes(&self) -> Result<&[u8], NodeError> {
        self.value
            .as_bytes()
            .ok_or_else(|| NodeError::mismatch("bytes", self.kind()))
    }

    /// Text view of a string or a byte sequence; invalid UTF-8 is replaced.
    pub fn text(&self) -> Result<Cow<'_, str>, NodeError> {
        match &self.value {
            Value::String(s) => Ok(Cow::Borrowed(&**s)),
            Value::Bytes(b) => Ok(String::from_utf8_lossy(b)),
            _ => Err(NodeError::mismatch("string or bytes", self.kind())),
        }
    }

    // ── Structural navigation ────────────────────────────────────────────

    /// Number of elements of an array, or of bytes in a byte sequence.
    pub fn len(&self) -> Result<usize, NodeError> {
        match &self.value {
            Value::Array(items) => Ok(items.len()),
            Value::Bytes(b) => Ok(b.len()),
            _ => Err(NodeError::mismatch("array or bytes", self.kind())),
        }
    }

    pub fn is_empty(&self) -> Result<bool, NodeError> {
        self.len().map(|len| len == 0)
    }

    /// Element `i` of an array. On a byte sequence the result is a
    /// one-character string whose code point is the byte.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` unless this is an array or byte sequence,
    /// `OutOfBounds` when `i >= len`.
    pub fn index(&self, i: usize) -> Result<Node, NodeError> {
        let len = self.len()?;
        self.element(i)
            .ok_or(NodeError::OutOfBounds { index: i, len })
    }

    pub(crate) fn element(&self, i: usize) -> Option<Node> {
        let value = match &self.value {
            Value::Array(items) => items.get(i)?.clone(),
            Value::Bytes(b) => Value::from(char::from(*b.get(i)?).to_string()),
            _ => return None,
        };
        Some(self.child(value, Position::Index(i)))
    }

    /// The half-open range `start..end` as a new array or byte sequence.
    ///
    /// The result's parent is `self`, but it has no key or index of its own.
    pub fn slice(&self, start: usize, end: usize) -> Result<Node, NodeError> {
        let len = self.len()?;
        if start > len {
            return Err(NodeError::OutOfBounds { index: start, len });
        }
        if end > len {
            return Err(NodeError::OutOfBounds { index: end, len });
        }
        if start > end {
            return Err(NodeError::InvalidRange { start, end, len });
        }
        let value = match &self.value {
            Value::Array(items) => Value::Array(Arc::from(&items[start..end])),
            Value::Bytes(b) => Value::bytes(&b[start..end]),
            _ => return Err(NodeError::mismatch("array or bytes", self.kind())),
        };
        Ok(self.child(value, Position::Slice { start, end }))
    }

    /// Field `key` of an object. A missing field yields a null node; use
    /// [`has`](Self::has) or [`try_get`](Self::try_get) to tell the two apart.
    pub fn get(&self, key: &str) -> Result<Node, NodeError> {
        let map = self
            .value
            .as_object()
            .ok_or_else(|| NodeError::mismatch("object", self.kind()))?;
        let value = map.get(key).cloned().unwrap_or_default();
        Ok(self.child(value, Position::Key(key.to_string())))
    }

    pub fn has(&self, key: &str) -> Result<bool, NodeError> {
        self.value
            .as_object()
            .map(|map| map.contains_key(key))
            .ok_or_else(|| NodeError::mismatch("object", self.kind()))
    }

    /// Field `key`, or `None` when it is absent or this is not an object.
    pub fn try_get(&self, key: &str) -> Option<Node> {
        let value = self.value.as_object()?.get(key)?.clone();
        Some(self.child(value, Position::Key(key.to_string())))
    }

    /// Field names of an object. Order is not meaningful.
    pub fn keys(&self) -> Result<Vec<String>, NodeError> {
        self.value
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .ok_or_else(|| NodeError::mismatch("object", self.kind()))
    }

    /// Child nodes of an array or byte sequence, in index order.
    pub fn elements(&self) -> Result<Elements, NodeError> {
        let len = self.len()?;
        Ok(Elements {
            parent: self.clone(),
            next: 0,
            len,
        })
    }

    /// `(key, child)` pairs of an object.
    pub fn entries(&self) -> Result<Entries, NodeError> {
        let len = self
            .value
            .as_object()
            .map(|map| map.len())
            .ok_or_else(|| NodeError::mismatch("object", self.kind()))?;
        Ok(Entries {
            parent: self.clone(),
            next: 0,
            len,
        })
    }

    /// Calls `f` for each element in index order until it returns `Break`.
    pub fn each_index<F>(&self, mut f: F) -> Result<(), NodeError>
    where
        F: FnMut(usize, Node) -> ControlFlow<()>,
    {
        for (i, child) in self.elements()?.enumerate() {
            if f(i, child).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Calls `f` for each field until it returns `Break`.
    pub fn each_key<F>(&self, mut f: F) -> Result<(), NodeError>
    where
        F: FnMut(&str, Node) -> ControlFlow<()>,
    {
        for (key, child) in self.entries()? {
            if f(&key, child).is_break() {
                break;
            }
        }
        Ok(())
    }

    // ── Round trip ───────────────────────────────────────────────────────

    /// Encodes this node's value with its codec.
    pub fn marshal(&self) -> Result<Vec<u8>, CodecError> {
        self.codec.encode(&self.value)
    }

    /// Converts this node into a typed value by encoding it with its codec
    /// and decoding the bytes again.
    ///
    /// # Example
    ///
    /// ```
    /// use json_node::Node;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Point { x: i32, y: i32 }
    ///
    /// let node = Node::from_bytes(br#"{"p":{"x":1,"y":2}}"#).unwrap();
    /// let p: Point = node.get("p").unwrap().unmarshal().unwrap();
    /// assert_eq!((p.x, p.y), (1, 2));
    /// ```
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, NodeError> {
        let data = self.marshal()?;
        let decoded = self.codec.decode(&data)?;
        Ok(T::deserialize(decoded)?)
    }

    // ── Parent context ───────────────────────────────────────────────────

    /// The node this one was reached from.
    ///
    /// The link is owned: a node keeps its whole ancestor chain alive. Use
    /// [`isolate`](Self::isolate) to hold on to a subtree without it.
    pub fn parent(&self) -> Option<&Node> {
        self.link.as_ref().map(|link| &link.parent)
    }

    pub fn position(&self) -> Option<&Position> {
        self.link.as_ref().map(|link| &link.position)
    }

    /// The field name this node was reached through, if any.
    pub fn parent_key(&self) -> Option<&str> {
        match self.position()? {
            Position::Key(key) => Some(key),
            _ => None,
        }
    }

    /// The element index this node was reached through, if any.
    pub fn parent_index(&self) -> Option<usize> {
        match self.position()? {
            Position::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.link.is_none()
    }

    /// Same value and codec, no parent.
    pub fn isolate(&self) -> Node {
        Self::root(self.value.clone(), self.codec.clone())
    }

    /// Steps from the root to this node. Indices below a slice are
    /// translated back into indices of the sliced collection.
    pub fn path(&self) -> Vec<PathStep> {
        let mut steps = Vec::new();
        let mut current = self;
        while let Some(link) = &current.link {
            match &link.position {
                Position::Key(key) => steps.push(PathStep::Key(key.clone())),
                Position::Index(i) => steps.push(PathStep::Index(*i)),
                Position::Slice { start, .. } => {
                    if let Some(PathStep::Index(i)) = steps.last_mut() {
                        *i += start;
                    }
                }
            }
            current = &link.parent;
        }
        steps.reverse();
        steps
    }

    /// [`path`](Self::path) as an RFC 6901 JSON Pointer; `""` for the root.
    pub fn pointer(&self) -> String {
        let mut out = String::new();
        for step in self.path() {
            out.push('/');
            match step {
                PathStep::Key(key) => out.push_str(&escape_component(&key)),
                PathStep::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

fn escape_component(component: &str) -> Cow<'_, str> {
    if !component.contains(|c| c == '/' || c == '~') {
        return Cow::Borrowed(component);
    }
    // `~` first, or the `~` of `~1` would be escaped again.
    Cow::Owned(component.replace('~', "~0").replace('/', "~1"))
}

/// Strings render as themselves, byte sequences as (lossy) text, anything
/// else as compact JSON.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::String(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("position", &self.position())
            .finish()
    }
}

/// Iterator returned by [`Node::elements`].
#[derive(Debug, Clone)]
pub struct Elements {
    parent: Node,
    next: usize,
    len: usize,
}

impl Iterator for Elements {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        if self.next >= self.len {
            return None;
        }
        let child = self.parent.element(self.next);
        self.next += 1;
        child
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for Elements {}

/// Iterator returned by [`Node::entries`].
#[derive(Debug, Clone)]
pub struct Entries {
    parent: Node,
    next: usize,
    len: usize,
}

impl Iterator for Entries {
    type Item = (String, Node);

    fn next(&mut self) -> Option<(String, Node)> {
        if self.next >= self.len {
            return None;
        }
        let (key, value) = self.parent.value.as_object()?.get_index(self.next)?;
        let entry = (
            key.clone(),
            self.parent
                .child(value.clone(), Position::Key(key.clone())),
        );
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for Entries {}
