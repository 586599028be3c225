//! Depth-first search over a node's descendants.
//!
//! A predicate is called on every descendant in pre-order (a node before its
//! children, array elements in index order) and answers with a [`Visit`]:
//! whether the node is a match, and whether the whole walk should stop.
//! Stopping is global: no further node anywhere in the tree is visited.
//!
//! The same walk is exposed three ways:
//!
//! - [`Node::find`] / [`Node::try_find`]: pull-based iterators that advance
//!   one step per `next()` call, keeping pending siblings on an explicit stack
//! - [`Node::traverse`]: a synchronous callback over every descendant
//! - [`Node::find_concurrent`]: a producer thread feeding a rendezvous
//!   channel; see [`FindStream`]

mod concurrent;

use std::convert::Infallible;
use std::iter::FusedIterator;
use std::ops::ControlFlow;

use tracing::debug;

use crate::node::{Elements, Entries, Node};
use crate::value::Value;

pub use concurrent::FindStream;

/// A predicate's verdict on one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visit {
    /// Emit this node.
    pub matched: bool,
    /// End the walk after this node; its children are not visited.
    pub stop: bool,
}

impl Visit {
    pub const fn new(matched: bool, stop: bool) -> Self {
        Self { matched, stop }
    }

    pub const fn skip() -> Self {
        Self::new(false, false)
    }

    pub const fn emit() -> Self {
        Self::new(true, false)
    }

    pub const fn halt() -> Self {
        Self::new(false, true)
    }

    pub const fn emit_and_halt() -> Self {
        Self::new(true, true)
    }
}

impl From<bool> for Visit {
    fn from(matched: bool) -> Self {
        Self::new(matched, false)
    }
}

impl From<(bool, bool)> for Visit {
    fn from((matched, stop): (bool, bool)) -> Self {
        Self::new(matched, stop)
    }
}

/// Pending children of one container.
#[derive(Debug)]
enum Children {
    Elements(Elements),
    Entries(Entries),
}

impl Children {
    /// Byte sequences and scalars have no structural children.
    fn of(node: &Node) -> Option<Self> {
        match node.value() {
            Value::Array(_) => node.elements().ok().map(Children::Elements),
            Value::Object(_) => node.entries().ok().map(Children::Entries),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<Node> {
        match self {
            Children::Elements(it) => it.next(),
            Children::Entries(it) => it.next().map(|(_, child)| child),
        }
    }
}

/// The walk itself, independent of how matches are delivered.
#[derive(Debug)]
pub(crate) struct Walker {
    stack: Vec<Children>,
    visited: usize,
}

impl Walker {
    pub(crate) fn new(root: &Node) -> Self {
        Self {
            stack: Children::of(root).into_iter().collect(),
            visited: 0,
        }
    }

    fn next_node(&mut self) -> Option<Node> {
        while let Some(top) = self.stack.last_mut() {
            if let Some(node) = top.next() {
                return Some(node);
            }
            self.stack.pop();
        }
        None
    }

    fn halt(&mut self) {
        self.stack.clear();
    }

    /// Visits nodes until one matches, the predicate fails, or the walk ends.
    pub(crate) fn step<P, E>(&mut self, predicate: &mut P) -> Option<Result<Node, E>>
    where
        P: FnMut(&Node) -> Result<Visit, E>,
    {
        loop {
            let node = self.next_node()?;
            self.visited += 1;
            let visit = match predicate(&node) {
                Ok(visit) => visit,
                Err(err) => {
                    debug!(visited = self.visited, "predicate failed, walk aborted");
                    self.halt();
                    return Some(Err(err));
                }
            };
            if visit.stop {
                debug!(visited = self.visited, pointer = %node.pointer(), "walk stopped by predicate");
                self.halt();
            } else if let Some(children) = Children::of(&node) {
                self.stack.push(children);
            }
            if visit.matched {
                return Some(Ok(node));
            }
        }
    }
}

/// Lazy search results; see [`Node::find`].
#[derive(Debug)]
pub struct Find<P> {
    walker: Walker,
    predicate: P,
}

impl<P> Iterator for Find<P>
where
    P: FnMut(&Node) -> Visit,
{
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let predicate = &mut self.predicate;
        let mut infallible = |node: &Node| Ok::<_, Infallible>(predicate(node));
        match self.walker.step(&mut infallible)? {
            Ok(node) => Some(node),
            Err(never) => match never {},
        }
    }
}

impl<P> FusedIterator for Find<P> where P: FnMut(&Node) -> Visit {}

/// Lazy search results with a fallible predicate; see [`Node::try_find`].
#[derive(Debug)]
pub struct TryFind<P> {
    walker: Walker,
    predicate: P,
}

impl<P, E> Iterator for TryFind<P>
where
    P: FnMut(&Node) -> Result<Visit, E>,
{
    type Item = Result<Node, E>;

    fn next(&mut self) -> Option<Result<Node, E>> {
        self.walker.step(&mut self.predicate)
    }
}

impl<P, E> FusedIterator for TryFind<P> where P: FnMut(&Node) -> Result<Visit, E> {}

impl Node {
    /// Searches the descendants of this node, yielding matches lazily in
    /// depth-first pre-order. The node itself is not tested.
    ///
    /// Dropping the iterator early releases everything; no work is done
    /// ahead of the consumer.
    ///
    /// # Example
    ///
    /// ```
    /// use json_node::{Node, Visit};
    ///
    /// let root = Node::from_bytes(br#"{"a":{"type":"Target"},"b":[{"type":"Target"}]}"#).unwrap();
    /// let hits: Vec<String> = root
    ///     .find(|n| Visit::from(n.parent_key() == Some("type") && n.as_str() == Some("Target")))
    ///     .map(|n| n.pointer())
    ///     .collect();
    /// assert_eq!(hits.len(), 2);
    /// assert!(hits.contains(&"/b/0/type".to_string()));
    /// ```
    pub fn find<P>(&self, predicate: P) -> Find<P>
    where
        P: FnMut(&Node) -> Visit,
    {
        Find {
            walker: Walker::new(self),
            predicate,
        }
    }

    /// Like [`find`](Self::find), but the predicate may fail. The first
    /// error is yielded in place of a match and ends the iteration.
    pub fn try_find<P, E>(&self, predicate: P) -> TryFind<P>
    where
        P: FnMut(&Node) -> Result<Visit, E>,
    {
        TryFind {
            walker: Walker::new(self),
            predicate,
        }
    }

    /// Calls `f` on every descendant in depth-first pre-order until it
    /// returns `Break`, which ends the whole walk. Returns how many nodes
    /// were visited.
    pub fn traverse<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&Node) -> ControlFlow<()>,
    {
        let mut walker = Walker::new(self);
        let mut visit = |node: &Node| {
            Ok::<_, Infallible>(match f(node) {
                ControlFlow::Continue(()) => Visit::skip(),
                ControlFlow::Break(()) => Visit::halt(),
            })
        };
        while walker.step(&mut visit).is_some() {}
        walker.visited
    }
}
