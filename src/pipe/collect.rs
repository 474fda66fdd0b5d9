use crate::queue::{ClosedFlag, Item, QueueReceiver};
use crate::{Result, StreamError};

/// Size hint for callers with no idea of the payload size.
pub const DEFAULT_SIZE_HINT: usize = 64 * 1024;

/// Contiguous buffer with explicit capacity, grown by doubling.
#[derive(Debug)]
pub(crate) struct GrowableBuffer {
    buf: Vec<u8>,
    filled: usize,
}

impl GrowableBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            filled: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.filled
    }

    /// Append `chunk`, doubling the capacity as many times as needed.
    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        let k = chunk.len();
        let capacity = self.capacity();
        if k > capacity - self.filled {
            let mut new_capacity = (capacity * 2).max(1);
            while k > new_capacity - self.filled {
                new_capacity *= 2;
            }
            log::trace!(
                "growing collect buffer from {} to {} bytes",
                capacity,
                new_capacity
            );
            self.buf.resize(new_capacity, 0);
        }
        debug_assert!(k <= self.capacity() - self.filled);

        self.buf[self.filled..self.filled + k].copy_from_slice(chunk);
        self.filled += k;
    }

    /// The filled prefix, as an owned buffer.
    pub(crate) fn into_filled(mut self) -> Vec<u8> {
        self.buf.truncate(self.filled);
        self.buf
    }
}

/// Blocking consumer that gathers a whole pipe payload into one buffer.
pub struct BlockingCollect {
    rx: QueueReceiver,
    closed: ClosedFlag,
    size_hint: usize,
}

impl BlockingCollect {
    pub(crate) fn new(rx: QueueReceiver, size_hint: usize) -> Self {
        Self {
            rx,
            closed: ClosedFlag::default(),
            size_hint,
        }
    }

    pub(crate) fn closed_flag(&self) -> ClosedFlag {
        self.closed.clone()
    }

    pub fn closed(&self) -> bool {
        self.closed.is_set()
    }

    /// Block until the writer signals end of stream and return every byte
    /// written, in order.
    pub fn get(&mut self) -> Result<Vec<u8>> {
        if self.closed.is_set() {
            return Err(StreamError::Closed("get"));
        }
        let mut buf = GrowableBuffer::with_capacity(self.size_hint);
        loop {
            match self.rx.get_blocking() {
                Item::Chunk(chunk) => buf.extend(&chunk),
                Item::End => {
                    self.closed.set();
                    log::debug!(
                        "collected {} bytes (hint {}, capacity {})",
                        buf.len(),
                        self.size_hint,
                        buf.capacity()
                    );
                    return Ok(buf.into_filled());
                }
            }
        }
    }
}
