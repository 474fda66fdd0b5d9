//! Readable and writable streams bridging async tasks and blocking threads.
//!
//! A stream is backed either by a blocking file-like handle driven on a
//! [`BlockingPool`], or by a single-slot queue shared with a consumer (or
//! producer) running on a blocking thread. See [`pipe`] for the latter.

pub mod blocking;
mod errors;
pub mod pipe;
pub mod pool;
pub mod queue;
pub mod stream;

pub use blocking::{
    blocking_readable_to_async, blocking_writable_to_async, BlockingSink,
    ReadableFromBlocking, WritableFromBlocking,
};
pub use errors::{Result, StreamError};
pub use pipe::{
    async_writable_blocking_collect_pair,
    async_writable_blocking_collect_pair_default,
    async_writable_blocking_readable_pair,
    blocking_writable_async_readable_pair, AsyncQueueReader, AsyncQueueWriter,
    BlockingCollect, BlockingQueueReader, BlockingQueueWriter,
};
pub use pool::BlockingPool;
pub use stream::{
    scoped, BaseStream, BaseStreamExt, Lifecycle, ReadableStream,
    WritableStream,
};

#[cfg(test)]
pub(crate) fn initialize() {
    let _ = env_logger::builder().is_test(true).try_init();
}
