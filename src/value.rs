//! Value cells: a head or tail that is either ready now or will resolve later
//!
//! [`Deferred`] is the single-resolution future every node relies on. It is
//! shared, so any number of consumers may await the same head or tail and
//! all of them observe the same value or the same failure.

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, Either, FutureExt, Ready, Shared};
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{StreamError, StreamResult};

/// Bound shared by everything a stream can carry
pub trait Element: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Element for T {}

/// A cloneable future that resolves exactly once to a value or a failure
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Deferred<T> {
    inner: Shared<BoxFuture<'static, StreamResult<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Deferred<T> {
    /// The settled outcome, if the future has already run to completion
    pub fn peek(&self) -> Option<&StreamResult<T>> {
        self.inner.peek()
    }
}

impl<T: Element> Deferred<T> {
    /// Wrap a future; it starts running the first time anything awaits it
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = StreamResult<T>> + Send + 'static,
    {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    pub fn ready(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    pub fn failed(err: StreamError) -> Self {
        Self::new(future::ready(Err(err)))
    }

    /// A not-yet-resolved value and the write end that settles it.
    ///
    /// Dropping the [`Resolver`] without settling fails the value with
    /// [`StreamError::Cancelled`].
    pub fn channel() -> (Resolver<T>, Self) {
        let (tx, rx) = oneshot::channel();
        let settled = async move {
            match rx.await {
                Ok(outcome) => outcome,
                Err(canceled) => Err(StreamError::from(canceled)),
            }
        };
        (Resolver { tx }, Self::new(settled))
    }

    /// Apply `f` once the value is available; failures skip `f`
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Element,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let this = self.clone();
        Deferred::new(async move { this.await.map(f) })
    }

    /// Chain a step that may itself be ready or pending
    pub fn then<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Element,
        F: FnOnce(T) -> Value<U> + Send + 'static,
    {
        let this = self.clone();
        Deferred::new(async move { f(this.await?).await })
    }
}

impl<T: Element> Future for Deferred<T> {
    type Output = StreamResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl<T: Clone> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.peek().is_some())
            .finish()
    }
}

/// Write end of [`Deferred::channel`]. Consumed by the first settle.
pub struct Resolver<T> {
    tx: oneshot::Sender<StreamResult<T>>,
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        if self.tx.send(Ok(value)).is_err() {
            log::trace!("deferred value resolved after every reader was dropped");
        }
    }

    pub fn reject(self, err: StreamError) {
        if self.tx.send(Err(err)).is_err() {
            log::trace!("deferred value rejected after every reader was dropped");
        }
    }
}

/// A head or tail cell: ready now, or pending on a [`Deferred`]
#[derive(Clone)]
pub enum Value<T> {
    Ready(T),
    Pending(Deferred<T>),
}

impl<T: Element> Value<T> {
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = StreamResult<T>> + Send + 'static,
    {
        Value::Pending(Deferred::new(fut))
    }

    /// The value, if it can be had without waiting
    pub fn now(&self) -> Option<T> {
        match self {
            Value::Ready(value) => Some(value.clone()),
            Value::Pending(deferred) => deferred.peek().and_then(|r| r.as_ref().ok().cloned()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Value::Ready(_))
    }

    /// Wait for the value without consuming the cell
    pub async fn resolve(&self) -> StreamResult<T> {
        match self {
            Value::Ready(value) => Ok(value.clone()),
            Value::Pending(deferred) => deferred.clone().await,
        }
    }

    /// Transform the value, immediately when it is already available
    pub fn map<U, F>(&self, f: F) -> Value<U>
    where
        U: Element,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Value::Ready(value) => Value::Ready(f(value.clone())),
            Value::Pending(deferred) => match deferred.peek() {
                Some(Ok(value)) => Value::Ready(f(value.clone())),
                _ => Value::Pending(deferred.map(f)),
            },
        }
    }

    /// Continue with a step that may itself be pending
    pub fn and_then<U, F>(&self, f: F) -> Value<U>
    where
        U: Element,
        F: FnOnce(T) -> Value<U> + Send + 'static,
    {
        match self {
            Value::Ready(value) => f(value.clone()),
            Value::Pending(deferred) => match deferred.peek() {
                Some(Ok(value)) => f(value.clone()),
                _ => Value::Pending(deferred.then(f)),
            },
        }
    }

    /// Combine with another cell once both are available.
    ///
    /// Both sides are awaited together; the first failure wins and the
    /// other side's outcome is discarded.
    pub fn zip_with<B, C, F>(&self, other: &Value<B>, f: F) -> Value<C>
    where
        B: Element,
        C: Element,
        F: FnOnce(T, B) -> C + Send + 'static,
    {
        if let (Some(a), Some(b)) = (self.now(), other.now()) {
            return Value::Ready(f(a, b));
        }
        let (left, right) = (self.clone(), other.clone());
        Value::pending(async move {
            let (a, b) = futures::try_join!(left.resolve(), right.resolve())?;
            Ok::<_, StreamError>(f(a, b))
        })
    }
}

impl<T> From<Deferred<T>> for Value<T> {
    fn from(deferred: Deferred<T>) -> Self {
        Value::Pending(deferred)
    }
}

impl<T: Element> IntoFuture for Value<T> {
    type Output = StreamResult<T>;
    type IntoFuture = Either<Ready<StreamResult<T>>, Deferred<T>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Value::Ready(value) => Either::Left(future::ready(Ok(value))),
            Value::Pending(deferred) => Either::Right(deferred),
        }
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Value::Pending(deferred) => f.debug_tuple("Pending").field(deferred).finish(),
        }
    }
}
