//! Stream nodes and their two tail disciplines
//!
//! A [`Stream`] is either the empty sentinel or a shared node holding a head
//! cell and a tail. The tail is *eager* (a node, or a future of one, fixed at
//! construction) or *lazy* (a one-shot recipe run on first access and cached
//! from then on). Nodes never change after construction apart from that one
//! memoization.

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::{StreamError, StreamResult};
use crate::value::{Deferred, Element, Value};

/// Builds a lazy tail on first demand
pub type TailRecipe<T> = Box<dyn FnOnce() -> Value<Stream<T>> + Send>;

/// A lazy, possibly infinite, possibly asynchronous cons stream.
///
/// Cloning is cheap: clones share the same nodes.
pub struct Stream<T> {
    node: Option<Arc<Node<T>>>,
}

pub(crate) struct Node<T> {
    head: Value<T>,
    tail: Tail<T>,
}

enum Tail<T> {
    Eager(Value<Stream<T>>),
    Lazy(LazyTail<T>),
}

struct LazyTail<T> {
    recipe: Mutex<Option<TailRecipe<T>>>,
    forced: OnceLock<Value<Stream<T>>>,
}

impl<T> Stream<T> {
    /// The empty stream
    pub const fn nil() -> Self {
        Stream { node: None }
    }

    /// True only for the empty sentinel
    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// Reference identity: the same node, or both the sentinel
    pub fn ptr_eq(&self, other: &Stream<T>) -> bool {
        match (&self.node, &other.node) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn as_node(&self) -> Option<&Arc<Node<T>>> {
        self.node.as_ref()
    }

    fn from_node(node: Node<T>) -> Self {
        Stream {
            node: Some(Arc::new(node)),
        }
    }
}

impl<T: Element> Stream<T> {
    /// A one-element stream
    pub fn single(head: T) -> Self {
        Self::cons(head, Stream::nil())
    }

    pub fn cons(head: T, tail: Stream<T>) -> Self {
        Self::node(Value::Ready(head), Value::Ready(tail))
    }

    /// A node with an eager tail, either a stream or a future of one
    pub fn node(head: Value<T>, tail: Value<Stream<T>>) -> Self {
        Self::from_node(Node {
            head,
            tail: Tail::Eager(tail),
        })
    }

    /// A node whose tail is built by `recipe` the first time it is needed.
    ///
    /// The recipe runs at most once, even when several tasks force the tail
    /// at the same time.
    pub fn lazy<F>(head: Value<T>, recipe: F) -> Self
    where
        F: FnOnce() -> Value<Stream<T>> + Send + 'static,
    {
        Self::from_node(Node {
            head,
            tail: Tail::Lazy(LazyTail {
                recipe: Mutex::new(Some(Box::new(recipe))),
                forced: OnceLock::new(),
            }),
        })
    }

    /// The head cell
    pub fn head(&self) -> StreamResult<&Value<T>> {
        self.node
            .as_deref()
            .map(Node::head)
            .ok_or_else(StreamError::empty_head)
    }

    /// The tail, forcing a lazy recipe if this is the first access
    pub fn tail(&self) -> StreamResult<Value<Stream<T>>> {
        self.node
            .as_deref()
            .map(Node::tail)
            .ok_or_else(StreamError::empty_tail)
    }

    /// Wait for the head value
    pub async fn first(&self) -> StreamResult<T> {
        self.head()?.resolve().await
    }

    /// Wait for the tail stream
    pub async fn rest(&self) -> StreamResult<Stream<T>> {
        self.tail()?.await
    }
}

impl<T: Element> Value<Stream<T>> {
    /// Head value of a stream that may not have arrived yet
    pub async fn first(&self) -> StreamResult<T> {
        self.resolve().await?.first().await
    }

    /// Tail of a stream that may not have arrived yet
    pub async fn rest(&self) -> StreamResult<Stream<T>> {
        self.resolve().await?.rest().await
    }
}

impl<T: Element> Node<T> {
    pub(crate) fn head(&self) -> &Value<T> {
        &self.head
    }

    pub(crate) fn tail(&self) -> Value<Stream<T>> {
        match &self.tail {
            Tail::Eager(tail) => tail.clone(),
            Tail::Lazy(lazy) => lazy.force(),
        }
    }
}

impl<T: Element> LazyTail<T> {
    fn force(&self) -> Value<Stream<T>> {
        self.forced
            .get_or_init(|| {
                let recipe = self.recipe.lock().ok().and_then(|mut slot| slot.take());
                match recipe {
                    Some(recipe) => recipe(),
                    None => Value::Pending(Deferred::failed(StreamError::Custom(
                        "lazy tail recipe was lost".to_string(),
                    ))),
                }
            })
            .clone()
    }
}

impl<T> Tail<T> {
    /// Take whatever concrete stream this tail already holds, leaving the
    /// sentinel behind.
    fn detach(&mut self) -> Stream<T> {
        let value = match self {
            Tail::Eager(value) => mem::replace(value, Value::Ready(Stream::nil())),
            Tail::Lazy(lazy) => match lazy.forced.take() {
                Some(value) => value,
                None => return Stream::nil(),
            },
        };
        match value {
            Value::Ready(stream) => stream,
            Value::Pending(deferred) => match deferred.peek() {
                Some(Ok(stream)) => stream.clone(),
                _ => Stream::nil(),
            },
        }
    }
}

// Long chains are unlinked in a loop; the default recursive drop would use
// one native frame per node.
impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        let mut next = self.tail.detach();
        while let Some(node) = next.node.take() {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.tail.detach(),
                Err(_) => break,
            }
        }
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            node: self.node.clone(),
        }
    }
}

impl<T> Default for Stream<T> {
    fn default() -> Self {
        Stream::nil()
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            None => write!(f, "Stream(nil)"),
            Some(node) => f
                .debug_struct("Stream")
                .field("head", &node.head)
                .finish_non_exhaustive(),
        }
    }
}
