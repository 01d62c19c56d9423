//! Stream combinators
//!
//! Operations that return a [`Stream`] build new nodes lazily and never
//! force more of their input than their own result demands. Operations that
//! return a [`Value`] may need to look ahead an unknown distance before the
//! first result node exists; they answer synchronously when the input is
//! already materialized and defer otherwise. Whole-stream reductions are
//! `async` and run on the trampolined engine.

use std::fmt::Display;
use std::future::IntoFuture;
use std::ops::{Add, ControlFlow, Mul};
use std::sync::Arc;

use crate::engine::{self, Seek, Trampoline};
use crate::error::{StreamError, StreamResult};
use crate::node::{Node, Stream};
use crate::value::{Element, Value};

impl<T: Element> Stream<T> {
    /// Call `f` with each value in order
    pub async fn each<F>(&self, mut f: F) -> StreamResult<()>
    where
        F: FnMut(T),
    {
        engine::fold(self, (), |(), value| f(value)).await
    }

    /// Left fold starting from `init`
    pub async fn fold<A, F>(&self, init: A, f: F) -> StreamResult<A>
    where
        F: FnMut(A, T) -> A,
    {
        engine::fold(self, init, f).await
    }

    /// Left fold seeded with the first value.
    ///
    /// Fails with [`StreamError::NoInitialValue`] on the empty stream.
    pub async fn reduce<F>(&self, f: F) -> StreamResult<T>
    where
        F: FnMut(T, T) -> T,
    {
        let node = self.as_node().ok_or(StreamError::NoInitialValue)?;
        let seed = node.head().resolve().await?;
        let rest = node.tail().await?;
        engine::fold(&rest, seed, f).await
    }

    /// The value at zero-based position `n`
    pub async fn item(&self, n: usize) -> StreamResult<T> {
        engine::index(self, n).await
    }

    /// Number of values. Never finishes on an infinite stream.
    pub async fn len(&self) -> StreamResult<usize> {
        engine::fold(self, 0, |count, _| count + 1).await
    }

    /// Collect every value. Never finishes on an infinite stream.
    pub async fn to_vec(&self) -> StreamResult<Vec<T>> {
        engine::fold(self, Vec::new(), |mut values, value| {
            values.push(value);
            values
        })
        .await
    }

    /// Whether any value equals `x`; stops at the first match
    pub async fn member(&self, x: &T) -> StreamResult<bool>
    where
        T: PartialEq,
    {
        let hit = engine::traverse(self, |value| {
            if value == *x {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;
        Ok(hit.is_some())
    }

    /// Position-wise comparison with `other`
    pub async fn equals_stream(&self, other: &Stream<T>) -> StreamResult<bool>
    where
        T: PartialEq,
    {
        equals(self, other).await
    }

    /// `"[stream 1,2,3]"`, or `"[stream null]"` for the empty stream
    pub async fn render(&self) -> StreamResult<String>
    where
        T: Display,
    {
        if self.is_empty() {
            return Ok("[stream null]".to_string());
        }
        let parts = engine::fold(self, Vec::new(), |mut parts, value| {
            parts.push(value.to_string());
            parts
        })
        .await?;
        Ok(format!("[stream {}]", parts.join(",")))
    }

    /// Print each value on its own line, or only the first `n` of them
    pub async fn print(&self, n: Option<usize>) -> StreamResult<()>
    where
        T: Display,
    {
        let target = match n {
            Some(n) => self.take(n),
            None => self.clone(),
        };
        target.each(|value| println!("{}", value)).await
    }

    /// At most the first `n` values. Nothing past position `n - 1` is forced.
    pub fn take(&self, n: usize) -> Stream<T> {
        if n == 0 {
            return Stream::nil();
        }
        let Some(node) = self.as_node().cloned() else {
            return Stream::nil();
        };
        if n == 1 {
            return Stream::node(node.head().clone(), Value::Ready(Stream::nil()));
        }
        Stream::lazy(node.head().clone(), move || {
            node.tail().map(move |tail| tail.take(n - 1))
        })
    }

    /// Alias of [`Stream::take`]
    pub fn limit(&self, n: usize) -> Stream<T> {
        self.take(n)
    }

    /// The stream after the first `n` values; the sentinel once exhausted
    pub fn drop_n(&self, n: usize) -> Value<Stream<T>> {
        let (cursor, remaining) = engine::advance_ready(self, n);
        if remaining == 0 || cursor.is_empty() {
            return Value::Ready(cursor);
        }
        Value::pending(engine::advance(cursor, remaining))
    }

    /// Apply `f` to every head; tails are mapped on demand
    pub fn map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Element,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        map_with(self, Arc::new(f))
    }

    /// Only the values satisfying `pred`
    pub fn filter<P>(&self, pred: P) -> Value<Stream<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        filter_from(self.clone(), Arc::new(pred))
    }

    /// This stream followed by `other`.
    ///
    /// Appending to the empty stream returns `other` itself; otherwise the
    /// spine is rebuilt lazily and `other` is untouched until this stream
    /// runs out.
    pub fn append(&self, other: &Stream<T>) -> Stream<T> {
        let Some(node) = self.as_node().cloned() else {
            return other.clone();
        };
        let other = other.clone();
        Stream::lazy(node.head().clone(), move || {
            node.tail().map(move |tail| tail.append(&other))
        })
    }

    /// Position-wise `f(a, b)`; when either side is empty the other side is
    /// returned unchanged
    pub fn combine<F>(&self, f: F, that: &Stream<T>) -> Stream<T>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        combine_with(self, Arc::new(f), that)
    }

    /// `f(x)` for every value, flattened in order.
    ///
    /// Same result as folding `append(f(x))` from the empty stream, but `f`
    /// only runs on positions that are actually forced.
    pub fn concat_map<U, F>(&self, f: F) -> Value<Stream<U>>
    where
        U: Element,
        F: Fn(T) -> Stream<U> + Send + Sync + 'static,
    {
        concat_map_from(self.clone(), Arc::new(f))
    }

    /// This stream followed by whatever `rest` produces
    fn chain<G>(&self, rest: G) -> Value<Stream<T>>
    where
        G: FnOnce() -> Value<Stream<T>> + Send + 'static,
    {
        let Some(node) = self.as_node().cloned() else {
            return rest();
        };
        Value::Ready(Stream::lazy(node.head().clone(), move || {
            node.tail().and_then(move |tail| tail.chain(rest))
        }))
    }
}

impl<T> Stream<T>
where
    T: Element + Add<Output = T>,
{
    /// Position-wise sum of two streams
    pub fn add(&self, that: &Stream<T>) -> Stream<T> {
        self.combine(|a, b| a + b, that)
    }

    pub async fn sum(&self) -> StreamResult<T>
    where
        T: Default,
    {
        engine::fold(self, T::default(), |total, value| total + value).await
    }
}

impl<T> Stream<T>
where
    T: Element + Mul<Output = T>,
{
    pub fn scale(&self, factor: T) -> Stream<T> {
        self.map(move |value| factor.clone() * value)
    }
}

/// Structural equality: same length, equal values position by position.
///
/// Heads are awaited together and the comparison stops at the first
/// mismatch. Two handles to the same node are equal without further work.
pub async fn equals<T>(a: &Stream<T>, b: &Stream<T>) -> StreamResult<bool>
where
    T: Element + PartialEq,
{
    let mut left = a.clone();
    let mut right = b.clone();
    let mut trampoline = Trampoline::new();
    loop {
        let (l, r) = match (left.as_node().cloned(), right.as_node().cloned()) {
            (None, None) => return Ok(true),
            (Some(l), Some(r)) => (l, r),
            _ => return Ok(false),
        };
        if Arc::ptr_eq(&l, &r) {
            return Ok(true);
        }
        let (x, y) = futures::try_join!(l.head().resolve(), r.head().resolve())?;
        if x != y {
            return Ok(false);
        }
        (left, right) = futures::try_join!(l.tail().into_future(), r.tail().into_future())?;
        trampoline.bounce().await;
    }
}

fn map_with<T, U, F>(stream: &Stream<T>, f: Arc<F>) -> Stream<U>
where
    T: Element,
    U: Element,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let Some(node) = stream.as_node().cloned() else {
        return Stream::nil();
    };
    let head = {
        let f = f.clone();
        node.head().map(move |value| f(value))
    };
    Stream::lazy(head, move || {
        node.tail().map(move |tail| map_with(&tail, f))
    })
}

fn filter_from<T, P>(stream: Stream<T>, pred: Arc<P>) -> Value<Stream<T>>
where
    T: Element,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    match engine::seek_ready(&stream, |value| pred(&value).then_some(value)) {
        Seek::Found(node, head) => Value::Ready(filtered_node(node, head, pred)),
        Seek::Exhausted => Value::Ready(Stream::nil()),
        Seek::Blocked(at) => Value::pending(async move {
            let stream = at.await?;
            let found = engine::seek(stream, |value| pred(&value).then_some(value)).await?;
            Ok::<_, StreamError>(match found {
                Some((node, head)) => filtered_node(node, head, pred),
                None => Stream::nil(),
            })
        }),
    }
}

fn filtered_node<T, P>(node: Arc<Node<T>>, head: T, pred: Arc<P>) -> Stream<T>
where
    T: Element,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    Stream::lazy(Value::Ready(head), move || {
        node.tail().and_then(move |tail| filter_from(tail, pred))
    })
}

fn combine_with<T, F>(a: &Stream<T>, f: Arc<F>, b: &Stream<T>) -> Stream<T>
where
    T: Element,
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    let (left, right) = match (a.as_node(), b.as_node()) {
        (None, _) => return b.clone(),
        (_, None) => return a.clone(),
        (Some(left), Some(right)) => (left.clone(), right.clone()),
    };
    let head = {
        let f = f.clone();
        left.head().zip_with(right.head(), move |x, y| f(x, y))
    };
    Stream::lazy(head, move || {
        left.tail()
            .zip_with(&right.tail(), move |l, r| combine_with(&l, f, &r))
    })
}

fn concat_map_from<T, U, F>(stream: Stream<T>, f: Arc<F>) -> Value<Stream<U>>
where
    T: Element,
    U: Element,
    F: Fn(T) -> Stream<U> + Send + Sync + 'static,
{
    let expand = |value: T| {
        let inner = f(value);
        (!inner.is_empty()).then_some(inner)
    };
    match engine::seek_ready(&stream, expand) {
        Seek::Found(node, inner) => splice(inner, node, f),
        Seek::Exhausted => Value::Ready(Stream::nil()),
        Seek::Blocked(at) => Value::pending(async move {
            let stream = at.await?;
            let found = engine::seek(stream, |value| {
                let inner = f(value);
                (!inner.is_empty()).then_some(inner)
            })
            .await?;
            match found {
                Some((node, inner)) => splice(inner, node, f).await,
                None => Ok(Stream::nil()),
            }
        }),
    }
}

/// `inner`, then the expansion of everything after `node`
fn splice<T, U, F>(inner: Stream<U>, node: Arc<Node<T>>, f: Arc<F>) -> Value<Stream<U>>
where
    T: Element,
    U: Element,
    F: Fn(T) -> Stream<U> + Send + Sync + 'static,
{
    inner.chain(move || {
        node.tail()
            .and_then(move |tail| concat_map_from(tail, f))
    })
}
