//! Stream constructors
//!
//! `make`, `from_vec` and `FromIterator` materialize finite streams eagerly.
//! Everything else builds lazily: each tail is a recipe that produces a
//! fresh node when forced, so infinite streams never form cycles.

use std::future::Future;
use std::sync::Arc;

use crate::error::StreamError;
use crate::node::Stream;
use crate::value::{Element, Value};

/// An eager stream of cells, each ready or pending
pub fn make<T, I>(cells: I) -> Stream<T>
where
    T: Element,
    I: IntoIterator<Item = Value<T>>,
{
    let cells: Vec<Value<T>> = cells.into_iter().collect();
    cells
        .into_iter()
        .rev()
        .fold(Stream::nil(), |tail, head| Stream::node(head, Value::Ready(tail)))
}

/// An eager stream of ready values
pub fn from_vec<T: Element>(values: Vec<T>) -> Stream<T> {
    make(values.into_iter().map(Value::Ready))
}

impl<T: Element> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        from_vec(iter.into_iter().collect())
    }
}

/// A lazy stream that pulls one item from `iter` per forced tail
pub fn from_iter_lazy<T, I>(iter: I) -> Stream<T>
where
    T: Element,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    pull(iter.into_iter())
}

fn pull<T, I>(mut iter: I) -> Stream<T>
where
    T: Element,
    I: Iterator<Item = T> + Send + 'static,
{
    match iter.next() {
        Some(head) => Stream::lazy(Value::Ready(head), move || Value::Ready(pull(iter))),
        None => Stream::nil(),
    }
}

/// Generate a lazy stream from a seed.
///
/// `f` produces a value and the next seed, or `None` to end the stream. It
/// runs once for the head and then once per forced tail.
///
/// # Examples
/// ```
/// use lazy_stream::unfold;
///
/// # async fn example() {
/// let fibonacci = unfold((0u64, 1u64), |(a, b)| Some((a, (b, a + b))));
/// let result = fibonacci.take(10).to_vec().await.unwrap();
/// assert_eq!(result, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
/// # }
/// ```
pub fn unfold<T, S, F>(seed: S, f: F) -> Stream<T>
where
    T: Element,
    S: Send + 'static,
    F: Fn(S) -> Option<(T, S)> + Send + Sync + 'static,
{
    unfold_with(seed, Arc::new(f))
}

fn unfold_with<T, S, F>(seed: S, f: Arc<F>) -> Stream<T>
where
    T: Element,
    S: Send + 'static,
    F: Fn(S) -> Option<(T, S)> + Send + Sync + 'static,
{
    match f(seed) {
        Some((head, next)) => Stream::lazy(Value::Ready(head), move || {
            Value::Ready(unfold_with(next, f))
        }),
        None => Stream::nil(),
    }
}

/// Like [`unfold`], but every step is a future.
///
/// The stream itself is therefore pending until the first step resolves.
pub fn unfold_async<T, S, F, Fut>(seed: S, f: F) -> Value<Stream<T>>
where
    T: Element,
    S: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<(T, S)>> + Send + 'static,
{
    unfold_async_with(seed, Arc::new(f))
}

fn unfold_async_with<T, S, F, Fut>(seed: S, f: Arc<F>) -> Value<Stream<T>>
where
    T: Element,
    S: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<(T, S)>> + Send + 'static,
{
    Value::pending(async move {
        let step = f(seed).await;
        Ok::<_, StreamError>(match step {
            Some((head, next)) => Stream::lazy(Value::Ready(head), move || {
                unfold_async_with(next, f)
            }),
            None => Stream::nil(),
        })
    })
}

/// `1, 1, 1, ...`
pub fn ones() -> Stream<i64> {
    unfold((), |()| Some((1, ())))
}

/// `1, 2, 3, ...`
pub fn ints() -> Stream<i64> {
    range(1, None)
}

/// Ascending integers from `low` (default 1) to `high` inclusive.
///
/// Without `high` the stream is unbounded. `low == high` gives one element
/// and `low > high` gives the empty stream.
pub fn range(low: impl Into<Option<i64>>, high: impl Into<Option<i64>>) -> Stream<i64> {
    let low = low.into().unwrap_or(1);
    let high = high.into();
    unfold(Some(low), move |next: Option<i64>| {
        let n = next?;
        if high.is_some_and(|high| n > high) {
            return None;
        }
        Some((n, n.checked_add(1)))
    })
}
