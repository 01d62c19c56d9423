//! Chunked sequential reads exposed as a lazy stream
//!
//! Each node carries one chunk. The tail of a full chunk is a future that
//! owns the open handle and performs the next read when forced, so at any
//! moment exactly one pending tail holds the handle. The handle is released
//! exactly once on whichever terminal path is reached first:
//!
//! - a short read (the final chunk, released before it is emitted),
//! - a read error (released before the failure is reported),
//! - abandonment (the pending tail is dropped unforced and the handle's
//!   `Drop` releases it).

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{StreamError, StreamResult};
use crate::node::Stream;
use crate::resource_tracker::GLOBAL_RESOURCE_TRACKER;
use crate::stream_configuration::{ReadConfig, DEFAULT_CHUNK_SIZE};
use crate::value::{Deferred, Value};

/// A resource read front to back in fixed-size chunks
#[async_trait]
pub trait SequentialResource: Send + 'static {
    /// Fill `buf` starting at `offset`. Returning fewer bytes than
    /// `buf.len()` means the resource is exhausted.
    async fn read_chunk(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Release the resource. Called at most once per handle.
    fn close(&mut self) -> io::Result<()>;
}

/// A file opened for reading through tokio
#[derive(Debug)]
pub struct FileResource {
    path: PathBuf,
    file: Option<File>,
}

impl FileResource {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        log::debug!("opened {}", path.display());
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// The path this resource was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SequentialResource for FileResource {
    async fn read_chunk(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("file already closed"))?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]).await? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }

    /// Drops the tokio file. Dropping cannot report an error, so this
    /// always succeeds and `ResourceCloseFailure` never arises for files.
    fn close(&mut self) -> io::Result<()> {
        if self.file.take().is_some() {
            log::debug!("closed {}", self.path.display());
        }
        Ok(())
    }
}

/// An in-memory resource, handy for tests and fixtures
#[derive(Debug, Clone)]
pub struct MemoryResource {
    data: Bytes,
    open: bool,
}

impl MemoryResource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            open: true,
        }
    }
}

#[async_trait]
impl SequentialResource for MemoryResource {
    async fn read_chunk(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if !self.open {
            return Err(io::Error::other("memory resource already closed"));
        }
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        Ok(())
    }
}

/// Lifecycle of a chunk stream's handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandleState {
    Opening = 0,
    Reading = 1,
    Exhausted = 2,
    Failed = 3,
    Abandoned = 4,
}

impl HandleState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => HandleState::Opening,
            1 => HandleState::Reading,
            2 => HandleState::Exhausted,
            3 => HandleState::Failed,
            _ => HandleState::Abandoned,
        }
    }

    /// Whether the handle has been released
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            HandleState::Exhausted | HandleState::Failed | HandleState::Abandoned
        )
    }
}

/// Read-only view of a handle's state, shared with the stream that owns it
#[derive(Debug, Clone, Default)]
pub struct HandleProbe {
    inner: Arc<ProbeState>,
}

#[derive(Debug, Default)]
struct ProbeState {
    state: AtomicU8,
    closed: AtomicBool,
    releases: AtomicUsize,
}

impl HandleProbe {
    pub fn state(&self) -> HandleState {
        HandleState::from_raw(self.inner.state.load(Ordering::Acquire))
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// How many times the underlying resource was actually released
    pub fn release_count(&self) -> usize {
        self.inner.releases.load(Ordering::Acquire)
    }

    fn set_state(&self, state: HandleState) {
        self.inner.state.store(state as u8, Ordering::Release);
    }

    /// Mark the handle closed; false if it already was
    fn close(&self, outcome: HandleState) -> bool {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.set_state(outcome);
        self.inner.releases.fetch_add(1, Ordering::AcqRel);
        true
    }
}

struct ResourceHandle<R: SequentialResource> {
    resource: R,
    cursor: u64,
    chunk_size: usize,
    probe: HandleProbe,
}

impl<R: SequentialResource> ResourceHandle<R> {
    fn new(resource: R, chunk_size: usize, probe: HandleProbe) -> Self {
        probe.set_state(HandleState::Reading);
        GLOBAL_RESOURCE_TRACKER.track_open();
        Self {
            resource,
            cursor: 0,
            chunk_size,
            probe,
        }
    }

    /// Close the resource unless it already is
    fn release(&mut self, outcome: HandleState) -> io::Result<()> {
        if !self.probe.close(outcome) {
            return Ok(());
        }
        GLOBAL_RESOURCE_TRACKER.track_release(outcome);
        log::debug!("releasing resource at offset {} ({:?})", self.cursor, outcome);
        self.resource.close()
    }
}

impl<R: SequentialResource> Drop for ResourceHandle<R> {
    fn drop(&mut self) {
        if self.probe.is_closed() {
            return;
        }
        log::warn!(
            "chunk stream abandoned at offset {}; releasing resource",
            self.cursor
        );
        if let Err(err) = self.release(HandleState::Abandoned) {
            log::error!("failed to release abandoned resource: {}", err);
        }
    }
}

/// A chunk stream and the probe observing its handle
#[derive(Debug, Clone)]
pub struct ResourceStream {
    pub stream: Deferred<Stream<Bytes>>,
    pub probe: HandleProbe,
}

/// Read the resource produced by `open` as a lazy stream of chunks.
///
/// Nothing happens until the stream future is first awaited; then the
/// resource is opened and the first chunk read. The future resolves to the
/// first node, or to the empty stream if the resource is empty.
pub fn read_resource<R, F>(open: F, config: ReadConfig) -> ResourceStream
where
    R: SequentialResource,
    F: Future<Output = io::Result<R>> + Send + 'static,
{
    let chunk_size = if config.chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        config.chunk_size
    };
    let probe = HandleProbe::default();
    let handle_probe = probe.clone();
    let stream = Deferred::new(async move {
        let resource = match open.await {
            Ok(resource) => resource,
            Err(err) => {
                handle_probe.set_state(HandleState::Failed);
                GLOBAL_RESOURCE_TRACKER.track_open_failure();
                log::warn!("failed to open resource: {}", err);
                return Err(StreamError::open(err));
            }
        };
        next_chunk(ResourceHandle::new(resource, chunk_size, handle_probe)).await
    });
    ResourceStream { stream, probe }
}

/// Read a file as a lazy stream of chunks
pub fn read_file(path: impl AsRef<Path>, config: ReadConfig) -> ResourceStream {
    let path = path.as_ref().to_path_buf();
    read_resource(FileResource::open(path), config)
}

/// Read a file in chunks of `chunk_size` bytes (default 100)
pub fn read_as_stream(path: impl AsRef<Path>, chunk_size: Option<usize>) -> Deferred<Stream<Bytes>> {
    let config = match chunk_size {
        Some(size) => ReadConfig::new().chunk_size(size),
        None => ReadConfig::default(),
    };
    read_file(path, config).stream
}

fn next_chunk<R: SequentialResource>(
    mut handle: ResourceHandle<R>,
) -> BoxFuture<'static, StreamResult<Stream<Bytes>>> {
    async move {
        let mut buf = vec![0u8; handle.chunk_size];
        let read = match handle.resource.read_chunk(&mut buf, handle.cursor).await {
            Ok(read) => read,
            Err(err) => {
                if let Err(close_err) = handle.release(HandleState::Failed) {
                    log::warn!("failed to close resource after read error: {}", close_err);
                }
                return Err(StreamError::read(err));
            }
        };
        buf.truncate(read);
        handle.cursor += read as u64;
        GLOBAL_RESOURCE_TRACKER.track_bytes(read);

        if read < handle.chunk_size {
            handle
                .release(HandleState::Exhausted)
                .map_err(StreamError::close)?;
            return Ok(if read == 0 {
                Stream::nil()
            } else {
                Stream::single(Bytes::from(buf))
            });
        }

        let tail = Deferred::new(next_chunk(handle));
        Ok(Stream::node(Value::Ready(Bytes::from(buf)), Value::Pending(tail)))
    }
    .boxed()
}
