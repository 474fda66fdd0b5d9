use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::pool::BlockingPool;
use crate::stream::{BaseStream, Lifecycle, ReadableStream, WritableStream};
use crate::{Result, StreamError};

/// A blocking sink that can be flushed all the way to durable storage.
pub trait BlockingSink: Write + Send + 'static {
    /// Force written data out of OS buffers. Only valid after `flush`.
    fn sync_all(&mut self) -> io::Result<()>;

    /// Whether the sink is known to accept writes. Unknown means `false`.
    fn writable(&self) -> bool {
        false
    }
}

impl BlockingSink for File {
    fn sync_all(&mut self) -> io::Result<()> {
        File::sync_all(self)
    }

    /// Checks the access mode the file was opened with.
    #[cfg(unix)]
    fn writable(&self) -> bool {
        use std::os::unix::io::AsRawFd;

        let flags = unsafe { libc::fcntl(self.as_raw_fd(), libc::F_GETFL) };
        if flags < 0 {
            return false;
        }
        matches!(flags & libc::O_ACCMODE, libc::O_WRONLY | libc::O_RDWR)
    }
}

impl<W: BlockingSink> BlockingSink for BufWriter<W> {
    fn sync_all(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_mut().sync_all()
    }

    fn writable(&self) -> bool {
        self.get_ref().writable()
    }
}

/// Blocking handle moved in and out of pool threads.
///
/// `None` once the handle has been released.
struct PooledHandle<H> {
    pool: BlockingPool,
    slot: Arc<Mutex<Option<H>>>,
}

impl<H: Send + 'static> PooledHandle<H> {
    fn new(pool: BlockingPool, handle: H) -> Self {
        Self {
            pool,
            slot: Arc::new(Mutex::new(Some(handle))),
        }
    }

    async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut H) -> io::Result<T> + Send + 'static,
    {
        let slot = self.slot.clone();
        self.pool
            .run(move || -> Result<T> {
                let mut guard = slot.lock()?;
                let handle = guard.as_mut().ok_or(StreamError::Closed(op))?;
                Ok(f(handle)?)
            })
            .await?
    }

    /// Drop the handle on a pool thread, closing it.
    ///
    /// `Drop` cannot fail, so an error from the OS close is not reported.
    async fn release(&self) -> Result<()> {
        let slot = self.slot.clone();
        self.pool
            .run(move || -> Result<()> {
                let handle = slot.lock()?.take();
                drop(handle);
                Ok(())
            })
            .await?
    }
}

pub struct ReadableFromBlocking<R> {
    lifecycle: Lifecycle,
    handle: PooledHandle<R>,
}

pub struct WritableFromBlocking<W> {
    lifecycle: Lifecycle,
    handle: PooledHandle<W>,
    writable: bool,
}

/// Expose a blocking reader as a [`ReadableStream`], reading on `pool`.
pub fn blocking_readable_to_async<R>(
    pool: BlockingPool,
    reader: R,
) -> ReadableFromBlocking<R>
where
    R: Read + Send + 'static,
{
    ReadableFromBlocking {
        lifecycle: Lifecycle::new(),
        handle: PooledHandle::new(pool, reader),
    }
}

/// Expose a blocking sink as a [`WritableStream`], writing on `pool`.
///
/// Teardown flushes, syncs, then closes the sink by dropping it. Flush and
/// sync errors reach the caller of `wait_closed`, but an error while
/// closing is lost: `Drop` has no way to report it. Callers that need it
/// should sync through [`BlockingSink::sync_all`], which runs first.
pub fn blocking_writable_to_async<W>(
    pool: BlockingPool,
    sink: W,
) -> WritableFromBlocking<W>
where
    W: BlockingSink,
{
    WritableFromBlocking {
        lifecycle: Lifecycle::new(),
        writable: sink.writable(),
        handle: PooledHandle::new(pool, sink),
    }
}

impl<R: Read + Send + 'static> BaseStream for ReadableFromBlocking<R> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    async fn teardown(&mut self) -> Result<()> {
        log::debug!("closing blocking reader");
        self.handle.release().await
    }
}

impl<R: Read + Send + 'static> ReadableStream for ReadableFromBlocking<R> {
    async fn read(&mut self, n: Option<usize>) -> Result<Bytes> {
        let data = self
            .handle
            .call("read", move |reader| {
                let mut buf = Vec::new();
                match n {
                    None => reader.read_to_end(&mut buf)?,
                    Some(n) => {
                        reader.by_ref().take(n as u64).read_to_end(&mut buf)?
                    }
                };
                Ok(buf)
            })
            .await?;
        log::trace!("read {} bytes from blocking reader", data.len());
        Ok(Bytes::from(data))
    }
}

impl<W: BlockingSink> BaseStream for WritableFromBlocking<W> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    /// Flush, fsync, then close. A failing step stops the sequence.
    async fn teardown(&mut self) -> Result<()> {
        log::debug!("flushing and closing blocking writer");
        self.handle.call("flush", |sink| sink.flush()).await?;
        self.handle.call("sync", |sink| sink.sync_all()).await?;
        self.handle.release().await
    }
}

impl<W: BlockingSink> WritableStream for WritableFromBlocking<W> {
    fn writable(&self) -> bool {
        self.writable
    }

    async fn write(&mut self, b: &[u8]) -> Result<usize> {
        let chunk = b.to_vec();
        let n = self
            .handle
            .call("write", move |sink| {
                sink.write_all(&chunk)?;
                Ok(chunk.len())
            })
            .await?;
        log::trace!("wrote {} bytes to blocking writer", n);
        Ok(n)
    }
}
