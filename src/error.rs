//! Error types for lazy streams
//!
//! Every combinator surfaces failures through the same future chain that
//! carries values, so errors must be cheap to clone: a resolved
//! [`crate::Deferred`] hands its output to every waiter.

use std::fmt;
use std::io;
use std::sync::Arc;

/// The part of a node that was requested from the empty stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePart {
    Head,
    Tail,
}

impl fmt::Display for NodePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodePart::Head => write!(f, "head"),
            NodePart::Tail => write!(f, "tail"),
        }
    }
}

/// Main error type for stream operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    /// Head or tail requested from the empty stream
    #[error("can't get the {part} of the empty stream")]
    EmptyStreamAccess { part: NodePart },
    /// Seedless fold over the empty stream
    #[error("no initial value")]
    NoInitialValue,
    /// The resource could not be opened
    #[error("failed to open resource: {0}")]
    ResourceOpenFailure(#[source] Arc<io::Error>),
    /// A chunk read failed; the resource has already been released
    #[error("failed to read resource: {0}")]
    ResourceReadFailure(#[source] Arc<io::Error>),
    /// Releasing the resource after the final chunk failed
    #[error("failed to close resource: {0}")]
    ResourceCloseFailure(#[source] Arc<io::Error>),
    /// A deferred value's resolver was dropped without resolving it
    #[error("deferred value was cancelled before it resolved")]
    Cancelled,
    /// Explicit rejection with a message
    #[error("stream error: {0}")]
    Custom(String),
}

impl StreamError {
    pub(crate) fn empty_head() -> Self {
        StreamError::EmptyStreamAccess {
            part: NodePart::Head,
        }
    }

    pub(crate) fn empty_tail() -> Self {
        StreamError::EmptyStreamAccess {
            part: NodePart::Tail,
        }
    }

    pub(crate) fn open(err: io::Error) -> Self {
        StreamError::ResourceOpenFailure(Arc::new(err))
    }

    pub(crate) fn read(err: io::Error) -> Self {
        StreamError::ResourceReadFailure(Arc::new(err))
    }

    pub(crate) fn close(err: io::Error) -> Self {
        StreamError::ResourceCloseFailure(Arc::new(err))
    }

    /// True for [`StreamError::EmptyStreamAccess`]
    pub fn is_empty_access(&self) -> bool {
        matches!(self, StreamError::EmptyStreamAccess { .. })
    }
}

impl From<futures::channel::oneshot::Canceled> for StreamError {
    fn from(_: futures::channel::oneshot::Canceled) -> Self {
        StreamError::Cancelled
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
