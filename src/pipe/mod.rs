//! In-memory pipes across the async / blocking boundary.
//!
//! Both ends share a single-slot [`handoff_queue`]. The constructors below
//! are the only way to get a correctly wired pair.

mod collect;
mod reader;
mod reverse;
mod writer;

pub use collect::{BlockingCollect, DEFAULT_SIZE_HINT};
pub use reader::BlockingQueueReader;
pub use reverse::{AsyncQueueReader, BlockingQueueWriter};
pub use writer::AsyncQueueWriter;

use crate::queue::handoff_queue;

/// Async writer feeding a file-like blocking reader.
pub fn async_writable_blocking_readable_pair(
) -> (AsyncQueueWriter, BlockingQueueReader) {
    let (tx, rx) = handoff_queue();
    let reader = BlockingQueueReader::new(rx);
    let writer = AsyncQueueWriter::new(tx, reader.closed_flag());
    (writer, reader)
}

/// Async writer feeding a blocking collector that starts with a buffer of
/// `size_hint` bytes.
pub fn async_writable_blocking_collect_pair(
    size_hint: usize,
) -> (AsyncQueueWriter, BlockingCollect) {
    let (tx, rx) = handoff_queue();
    let collect = BlockingCollect::new(rx, size_hint);
    let writer = AsyncQueueWriter::new(tx, collect.closed_flag());
    (writer, collect)
}

pub fn async_writable_blocking_collect_pair_default(
) -> (AsyncQueueWriter, BlockingCollect) {
    async_writable_blocking_collect_pair(DEFAULT_SIZE_HINT)
}

/// Blocking writer feeding an async reader.
pub fn blocking_writable_async_readable_pair(
) -> (BlockingQueueWriter, AsyncQueueReader) {
    let (tx, rx) = handoff_queue();
    let reader = AsyncQueueReader::new(rx);
    let writer = BlockingQueueWriter::new(tx, reader.closed_flag());
    (writer, reader)
}
