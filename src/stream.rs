use std::future::Future;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::Result;

/// Closed / torn-down flags shared by every stream.
///
/// `close` only flips a flag. Teardown runs at most once, even if it fails
/// or the caller drops the `wait_closed` future half way through.
#[derive(Debug, Default)]
pub struct Lifecycle {
    closed: bool,
    waited_closed: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_torn_down(&self) -> bool {
        self.waited_closed
    }

    /// Mark the stream closed and claim the teardown.
    /// Returns `false` if teardown was already attempted.
    pub(crate) fn begin_teardown(&mut self) -> bool {
        self.closed = true;
        if self.waited_closed {
            return false;
        }
        self.waited_closed = true;
        true
    }
}

pub trait BaseStream: Send {
    fn lifecycle(&self) -> &Lifecycle;

    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Release the underlying resource.
    ///
    /// Only ever invoked through [`BaseStreamExt::wait_closed`], which
    /// guarantees it runs at most once per stream.
    fn teardown(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn close(&mut self) {
        self.lifecycle_mut().close();
    }

    fn closed(&self) -> bool {
        self.lifecycle().is_closed()
    }
}

/// Teardown entry point for every [`BaseStream`].
///
/// Only implemented through the blanket impl below, so the run-once
/// check cannot be replaced by a stream.
pub trait BaseStreamExt: BaseStream {
    /// Close the stream and release its resource.
    ///
    /// Safe to call repeatedly: only the first call runs [`teardown`].
    /// If that first teardown fails the error is returned once, later calls
    /// return `Ok(())` without retrying.
    ///
    /// [`teardown`]: BaseStream::teardown
    fn wait_closed(&mut self) -> impl Future<Output = Result<()>> + Send;
}

impl<S: BaseStream + ?Sized> BaseStreamExt for S {
    fn wait_closed(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if !self.lifecycle_mut().begin_teardown() {
                return Ok(());
            }
            self.teardown().await
        }
    }
}

pub trait ReadableStream: BaseStream {
    /// Read up to `n` bytes, or everything that is left when `n` is `None`.
    /// An empty result means end of stream.
    fn read(
        &mut self,
        n: Option<usize>,
    ) -> impl Future<Output = Result<Bytes>> + Send;
}

pub trait WritableStream: BaseStream {
    /// Whether the underlying sink is known to accept writes.
    fn writable(&self) -> bool {
        false
    }

    /// Submit `b` for output. Returns `b.len()` on success.
    fn write(
        &mut self,
        b: &[u8],
    ) -> impl Future<Output = Result<usize>> + Send;
}

/// Run `body` with the stream, then always `wait_closed` it.
///
/// An error from `body` wins over a teardown error, which is only logged.
pub async fn scoped<S, T, F>(mut stream: S, body: F) -> Result<T>
where
    S: BaseStream,
    F: for<'a> FnOnce(&'a mut S) -> BoxFuture<'a, Result<T>>,
{
    let outcome = body(&mut stream).await;
    let closed = stream.wait_closed().await;
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(teardown_err)) => {
            log::warn!(
                "teardown failed after scoped error: {}",
                teardown_err
            );
            Err(err)
        }
    }
}
