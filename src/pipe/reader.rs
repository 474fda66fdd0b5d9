use std::io;

use bytes::Bytes;

use crate::queue::{ClosedFlag, Item, QueueReceiver};
use crate::{Result, StreamError};

/// Blocking, file-like end of an async-to-blocking pipe.
///
/// Every `read_into` fills the whole destination unless the end of the
/// stream is reached. Upload clients with a minimum part size reject
/// anything shorter.
pub struct BlockingQueueReader {
    rx: QueueReceiver,
    closed: ClosedFlag,
    saw_eos: bool,
    unread: Bytes,
}

impl BlockingQueueReader {
    pub(crate) fn new(rx: QueueReceiver) -> Self {
        Self {
            rx,
            closed: ClosedFlag::default(),
            saw_eos: false,
            unread: Bytes::new(),
        }
    }

    pub(crate) fn closed_flag(&self) -> ClosedFlag {
        self.closed.clone()
    }

    pub fn readable(&self) -> bool {
        true
    }

    pub fn closed(&self) -> bool {
        self.closed.is_set()
    }

    /// Block until `buf` is full or the writer signalled end of stream.
    /// Returns the number of bytes placed, 0 only at end of stream.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed.is_set() {
            return Err(StreamError::Closed("read"));
        }
        if self.saw_eos {
            return Ok(0);
        }

        let mut total = 0;
        while total < buf.len() {
            if self.unread.is_empty() {
                match self.rx.get_blocking() {
                    Item::Chunk(chunk) => self.unread = chunk,
                    Item::End => {
                        log::debug!("pipe reader reached end of stream");
                        self.saw_eos = true;
                        return Ok(total);
                    }
                }
            }

            let n = self.unread.len().min(buf.len() - total);
            let part = self.unread.split_to(n);
            buf[total..total + n].copy_from_slice(&part);
            total += n;
        }
        debug_assert!(total == buf.len());
        Ok(total)
    }

    /// Mark the reader closed and discard whatever the writer still sends,
    /// so a writer blocked on the full queue can make progress.
    pub fn close(&mut self) {
        self.closed.set();
        self.unread = Bytes::new();
        while !self.saw_eos {
            if let Item::End = self.rx.get_blocking() {
                self.saw_eos = true;
            }
        }
        log::debug!("pipe reader closed");
    }
}

impl io::Read for BlockingQueueReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf)?)
    }
}
