use async_stream::stream;
use futures_core::stream::BoxStream;
use futures_util::stream::StreamExt;

use crate::error::StreamResult;
use crate::node::Stream;
use crate::value::{Element, Value};

impl<T: Element> Stream<T> {
    /// Drive this stream as a `futures` stream.
    ///
    /// Each value is yielded as it resolves. A failure is yielded once and
    /// ends the output.
    pub fn into_stream(self) -> BoxStream<'static, StreamResult<T>> {
        stream! {
            let mut cursor = self;
            while let Some(node) = cursor.as_node().cloned() {
                match node.head().resolve().await {
                    Ok(value) => yield Ok(value),
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
                cursor = match node.tail().await {
                    Ok(next) => next,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                };
            }
        }
        .boxed()
    }
}

impl<T: Element> Value<Stream<T>> {
    /// Like [`Stream::into_stream`], waiting for the stream first
    pub fn into_stream(self) -> BoxStream<'static, StreamResult<T>> {
        stream! {
            match self.await {
                Ok(inner) => {
                    let mut inner = inner.into_stream();
                    while let Some(item) = inner.next().await {
                        yield item;
                    }
                }
                Err(err) => yield Err(err),
            }
        }
        .boxed()
    }
}
