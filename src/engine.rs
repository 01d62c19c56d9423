//! Trampolined traversal drivers
//!
//! Every whole-stream operation is a loop over nodes, never a recursive
//! call per node, so neither infinite nor very long streams grow the native
//! stack. Synchronous runs give control back to the scheduler every
//! `yield_interval` nodes, and the synchronous fast paths used to build
//! result nodes stop after `sync_budget` steps and defer the remainder.

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::error::StreamResult;
use crate::node::{Node, Stream};
use crate::stream_configuration::EngineConfig;
use crate::value::{Element, Value};

/// Counts visited nodes and yields at every checkpoint
pub(crate) struct Trampoline {
    interval: usize,
    steps: usize,
}

impl Trampoline {
    pub(crate) fn new() -> Self {
        Self {
            interval: EngineConfig::current().yield_interval,
            steps: 0,
        }
    }

    pub(crate) async fn bounce(&mut self) {
        self.steps += 1;
        if self.steps % self.interval == 0 {
            log::trace!("trampoline checkpoint after {} nodes", self.steps);
            tokio::task::yield_now().await;
        }
    }
}

/// Left fold that may stop early
pub(crate) async fn try_fold<T, A, B, F>(
    stream: &Stream<T>,
    init: A,
    mut f: F,
) -> StreamResult<ControlFlow<B, A>>
where
    T: Element,
    F: FnMut(A, T) -> ControlFlow<B, A>,
{
    let mut acc = init;
    let mut cursor = stream.clone();
    let mut trampoline = Trampoline::new();
    while let Some(node) = cursor.as_node().cloned() {
        let value = node.head().resolve().await?;
        acc = match f(acc, value) {
            ControlFlow::Continue(acc) => acc,
            ControlFlow::Break(done) => return Ok(ControlFlow::Break(done)),
        };
        cursor = node.tail().await?;
        trampoline.bounce().await;
    }
    Ok(ControlFlow::Continue(acc))
}

pub(crate) async fn fold<T, A, F>(stream: &Stream<T>, init: A, mut f: F) -> StreamResult<A>
where
    T: Element,
    F: FnMut(A, T) -> A,
{
    let flow = try_fold(stream, init, |acc, value| {
        ControlFlow::<Infallible, A>::Continue(f(acc, value))
    })
    .await?;
    match flow {
        ControlFlow::Continue(acc) => Ok(acc),
        ControlFlow::Break(never) => match never {},
    }
}

/// Visit values in order until `visit` breaks; returns the break value
pub(crate) async fn traverse<T, B, F>(stream: &Stream<T>, mut visit: F) -> StreamResult<Option<B>>
where
    T: Element,
    F: FnMut(T) -> ControlFlow<B>,
{
    let flow = try_fold(stream, (), |(), value| visit(value)).await?;
    Ok(match flow {
        ControlFlow::Break(done) => Some(done),
        ControlFlow::Continue(()) => None,
    })
}

/// The value at position `n`. Heads before `n` are never awaited.
pub(crate) async fn index<T: Element>(stream: &Stream<T>, n: usize) -> StreamResult<T> {
    let mut cursor = stream.clone();
    let mut trampoline = Trampoline::new();
    for _ in 0..n {
        cursor = cursor.rest().await?;
        trampoline.bounce().await;
    }
    cursor.first().await
}

/// Skip up to `n` nodes, stopping early at the sentinel
pub(crate) async fn advance<T: Element>(stream: Stream<T>, n: usize) -> StreamResult<Stream<T>> {
    let mut cursor = stream;
    let mut trampoline = Trampoline::new();
    for _ in 0..n {
        let Some(node) = cursor.as_node().cloned() else {
            break;
        };
        cursor = node.tail().await?;
        trampoline.bounce().await;
    }
    Ok(cursor)
}

/// Synchronous prefix of [`advance`]: walks ready tails within the budget
pub(crate) fn advance_ready<T: Element>(stream: &Stream<T>, n: usize) -> (Stream<T>, usize) {
    let budget = EngineConfig::current().sync_budget;
    let mut cursor = stream.clone();
    let mut remaining = n;
    while remaining > 0 && n - remaining < budget {
        let Some(node) = cursor.as_node().cloned() else {
            break;
        };
        match node.tail().now() {
            Some(next) => cursor = next,
            None => break,
        }
        remaining -= 1;
    }
    (cursor, remaining)
}

/// Outcome of a synchronous search
pub(crate) enum Seek<T, R> {
    /// A node whose head was accepted, with what `accept` produced for it
    Found(Arc<Node<T>>, R),
    /// The stream ended without a match
    Exhausted,
    /// The search needs to wait; resume from this position
    Blocked(Value<Stream<T>>),
}

/// Search for the first accepted head without awaiting anything.
///
/// Stops at the first pending head or tail, or once the budget is spent.
pub(crate) fn seek_ready<T, R, F>(stream: &Stream<T>, mut accept: F) -> Seek<T, R>
where
    T: Element,
    F: FnMut(T) -> Option<R>,
{
    let budget = EngineConfig::current().sync_budget;
    let mut cursor = stream.clone();
    for _ in 0..budget {
        let Some(node) = cursor.as_node().cloned() else {
            return Seek::Exhausted;
        };
        let Some(value) = node.head().now() else {
            return Seek::Blocked(Value::Ready(cursor));
        };
        if let Some(found) = accept(value) {
            return Seek::Found(node, found);
        }
        let tail = node.tail();
        match tail.now() {
            Some(next) => cursor = next,
            None => return Seek::Blocked(tail),
        }
    }
    Seek::Blocked(Value::Ready(cursor))
}

/// Asynchronous search for the first accepted head
pub(crate) async fn seek<T, R, F>(
    stream: Stream<T>,
    mut accept: F,
) -> StreamResult<Option<(Arc<Node<T>>, R)>>
where
    T: Element,
    F: FnMut(T) -> Option<R>,
{
    let mut cursor = stream;
    let mut trampoline = Trampoline::new();
    while let Some(node) = cursor.as_node().cloned() {
        let value = node.head().resolve().await?;
        if let Some(found) = accept(value) {
            return Ok(Some((node, found)));
        }
        cursor = node.tail().await?;
        trampoline.bounce().await;
    }
    Ok(None)
}
