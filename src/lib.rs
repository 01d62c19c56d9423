//! Lazy, async-aware cons streams.
//!
//! A [`Stream`] is a singly linked list whose heads and tails may be
//! available now or arrive later through a [`Deferred`]. Combinators behave
//! the same either way and traverse iteratively, so infinite and very long
//! streams never grow the native stack.
//!
//! ```
//! use lazy_stream::{ints, Stream};
//!
//! # async fn example() -> lazy_stream::StreamResult<()> {
//! let evens = ints().filter(|n| n % 2 == 0).await?;
//! assert_eq!(evens.take(3).to_vec().await?, vec![2, 4, 6]);
//!
//! let letters: Stream<char> = "abc".chars().collect();
//! assert_eq!(letters.render().await?, "[stream a,b,c]");
//! # Ok(())
//! # }
//! ```

pub mod combinators;
pub mod constructors;
mod engine;
pub mod error;
pub mod interop;
pub mod node;
pub mod read;
pub mod resource_tracker;
pub mod stream_configuration;
pub mod value;

pub use combinators::equals;
pub use constructors::{from_iter_lazy, from_vec, ints, make, ones, range, unfold, unfold_async};
pub use error::{NodePart, StreamError, StreamResult};
pub use node::{Stream, TailRecipe};
pub use read::{
    read_as_stream, read_file, read_resource, FileResource, HandleProbe, HandleState,
    MemoryResource, ResourceStream, SequentialResource,
};
pub use resource_tracker::{get_global_resource_tracker, ResourceMetrics, ResourceTracker};
pub use stream_configuration::{configure, EngineConfig, ReadConfig, DEFAULT_CHUNK_SIZE};
pub use value::{Deferred, Element, Resolver, Value};
