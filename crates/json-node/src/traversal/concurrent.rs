//! Producer/consumer form of the search.
//!
//! A dedicated thread performs the walk and hands each match over a
//! zero-capacity channel, so it is never more than one match ahead of the
//! consumer. The consumer may walk away at any time: dropping (or
//! cancelling) the [`FindStream`] raises a flag the producer checks before
//! every visit and disconnects the channel, which wakes a producer blocked
//! on a hand-off. The producer thread is joined before the stream is gone.
//!
//! A panic in the predicate is re-raised on the consumer thread by the
//! `next()` call that observes the end of the stream.

use std::convert::Infallible;
use std::io;
use std::iter::FusedIterator;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use super::{Visit, Walker};
use crate::node::Node;

/// Matches produced on another thread; see [`Node::find_concurrent`].
#[derive(Debug)]
pub struct FindStream<E = Infallible> {
    matches: Option<Receiver<Result<Node, E>>>,
    cancelled: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
}

impl<E> FindStream<E> {
    /// Stops the producer and waits for it to exit. Matches not yet
    /// received are discarded; `next()` returns `None` afterwards.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.matches = None;
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                warn!("find producer panicked after the stream was cancelled");
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl FindStream<Infallible> {
    /// Drops the error type of an infallible stream.
    pub fn nodes(self) -> impl Iterator<Item = Node> {
        self.map(|item| match item {
            Ok(node) => node,
            Err(never) => match never {},
        })
    }
}

impl<E> Iterator for FindStream<E> {
    type Item = Result<Node, E>;

    fn next(&mut self) -> Option<Result<Node, E>> {
        let item = self.matches.as_ref()?.recv().ok();
        if item.is_none() {
            self.matches = None;
            if let Some(producer) = self.producer.take() {
                if let Err(payload) = producer.join() {
                    panic::resume_unwind(payload);
                }
            }
        }
        item
    }
}

impl<E> FusedIterator for FindStream<E> {}

impl<E> Drop for FindStream<E> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Node {
    /// Runs [`find`](Node::find) on a producer thread and streams the
    /// matches back in the same depth-first pre-order.
    ///
    /// # Errors
    ///
    /// Fails only if the producer thread cannot be spawned.
    ///
    /// # Panics
    ///
    /// A panic in `predicate` resumes on the thread that drains the stream.
    ///
    /// # Example
    ///
    /// ```
    /// use json_node::{Node, Visit};
    ///
    /// let root = Node::from_bytes(b"[1, [2, 3], 4]").unwrap();
    /// let mut stream = root.find_concurrent(|n| Visit::from(n.is_number())).unwrap();
    /// assert_eq!(stream.next().unwrap().unwrap().int(), Ok(1));
    /// // Dropping the stream here stops the producer; nothing is leaked.
    /// ```
    pub fn find_concurrent<P>(&self, mut predicate: P) -> io::Result<FindStream>
    where
        P: FnMut(&Node) -> Visit + Send + 'static,
    {
        self.try_find_concurrent(move |node: &Node| Ok::<_, Infallible>(predicate(node)))
    }

    /// Like [`find_concurrent`](Self::find_concurrent) with a fallible
    /// predicate. The first error is delivered to the consumer and ends
    /// the stream.
    pub fn try_find_concurrent<P, E>(&self, predicate: P) -> io::Result<FindStream<E>>
    where
        P: FnMut(&Node) -> Result<Visit, E> + Send + 'static,
        E: Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(0);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let root = self.clone();
        let producer = thread::Builder::new()
            .name("json-node-find".into())
            .spawn(move || produce(root, predicate, tx, flag))?;
        Ok(FindStream {
            matches: Some(rx),
            cancelled,
            producer: Some(producer),
        })
    }
}

fn produce<P, E>(
    root: Node,
    mut predicate: P,
    tx: Sender<Result<Node, E>>,
    cancelled: Arc<AtomicBool>,
)
where
    P: FnMut(&Node) -> Result<Visit, E>,
{
    let mut walker = Walker::new(&root);
    let mut guarded = |node: &Node| {
        if cancelled.load(Ordering::Acquire) {
            Ok(Visit::halt())
        } else {
            predicate(node)
        }
    };
    while let Some(item) = walker.step(&mut guarded) {
        if tx.send(item).is_err() {
            debug!("find consumer went away, producer exiting");
            return;
        }
    }
    if cancelled.load(Ordering::Acquire) {
        debug!("find cancelled by consumer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_streams_in_preorder() {
        let root = Node::from_value(json!([1, [2, [4]], 3]));
        let found: Vec<i64> = root
            .find_concurrent(|n| Visit::from(n.is_number()))
            .unwrap()
            .nodes()
            .map(|n| n.int().unwrap())
            .collect();
        assert_eq!(found, vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_predicate_stop_ends_stream() {
        let root = Node::from_value(json!([1, [2, [4]], 3]));
        let found: Vec<i64> = root
            .find_concurrent(|n| Visit::new(n.is_number(), n.int() == Ok(2)))
            .unwrap()
            .nodes()
            .map(|n| n.int().unwrap())
            .collect();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn test_early_drop_stops_producer() {
        let items: Vec<i64> = (0..10_000).collect();
        let root = Node::from_value(json!(items));
        let visits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&visits);
        let mut stream = root
            .find_concurrent(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Visit::emit()
            })
            .unwrap();
        assert_eq!(stream.next().unwrap().unwrap().int(), Ok(0));
        // Drop joins the producer, so the count is final afterwards.
        drop(stream);
        let seen = visits.load(Ordering::SeqCst);
        assert!(seen <= 3, "producer kept walking: {seen} visits");
    }

    #[test]
    #[should_panic(expected = "predicate failed on 2")]
    fn test_predicate_panic_reaches_consumer() {
        let root = Node::from_value(json!([1, 2, 3]));
        let mut stream = root
            .find_concurrent(|n| {
                if n.int() == Ok(2) {
                    panic!("predicate failed on 2");
                }
                Visit::emit()
            })
            .unwrap()
            .nodes();
        assert_eq!(stream.next().unwrap().int(), Ok(1));
        stream.next();
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let root = Node::from_value(json!([1, 2, 3]));
        let mut stream = root.find_concurrent(|_| Visit::emit()).unwrap();
        stream.cancel();
        assert!(stream.is_cancelled());
        assert!(stream.next().is_none());
        stream.cancel();
    }

    #[test]
    fn test_error_reaches_consumer() {
        let root = Node::from_value(json!([1, "two", 3]));
        let items: Vec<_> = root
            .try_find_concurrent(|n| n.int().map(|_| Visit::emit()))
            .unwrap()
            .collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().int(), Ok(1));
        assert!(items[1].is_err());
    }
}
